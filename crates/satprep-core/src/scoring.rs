//! SAT-style scoring of a validated attempt.
//!
//! Scoring is a pure function of `(Test, TestAttempt)`: the resulting
//! [`TestResult`] carries no timestamps or generated ids, so identical inputs
//! always produce identical results.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::{Subject, Test, TestAttempt};
use crate::normalizer::answers_match;
use crate::scale::scale_section;

/// The computed scoring output for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: String,
    pub attempt_id: String,
    /// Aggregate over all sections.
    pub overall: OverallScore,
    /// One entry per section, in test order.
    pub sections: Vec<SectionScore>,
    /// Performance grouped by topic tag.
    pub topics: BTreeMap<String, TopicPerformance>,
    /// Performance grouped by skill tag.
    pub skills: BTreeMap<String, SkillPerformance>,
    /// Per-question outcomes, in test order.
    pub questions: Vec<QuestionOutcome>,
}

/// Overall score across sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallScore {
    /// Raw points earned.
    pub earned: u32,
    /// Raw points available.
    pub possible: u32,
    /// Combined scaled score.
    pub scaled: u32,
    /// Lowest achievable scaled score.
    pub min_scaled: u32,
    /// Highest achievable scaled score.
    pub max_scaled: u32,
}

/// Score for a single section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub section_id: String,
    pub subject: Subject,
    /// Raw points earned, never above `possible`.
    pub earned: u32,
    pub possible: u32,
    /// Questions answered correctly.
    pub correct: u32,
    /// Questions with a submitted answer.
    pub answered: u32,
    /// Questions in the section.
    pub total: u32,
    /// Scaled section score.
    pub scaled: u32,
}

impl SectionScore {
    pub fn percentage(&self) -> f64 {
        percentage(self.earned, self.possible)
    }
}

/// Aggregate correctness for a group of questions sharing a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub earned: u32,
    pub possible: u32,
    pub correct: u32,
    pub total: u32,
    /// `earned / possible` as a percentage in `0.0..=100.0`.
    pub percentage: f64,
}

/// Performance for one topic tag.
pub type TopicPerformance = Performance;
/// Performance for one skill tag.
pub type SkillPerformance = Performance;

impl Performance {
    fn record(&mut self, points: u32, correct: bool) {
        self.possible += points;
        self.total += 1;
        if correct {
            self.earned += points;
            self.correct += 1;
        }
    }

    fn finish(mut self) -> Self {
        self.percentage = percentage(self.earned, self.possible);
        self
    }
}

/// Outcome for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub section_id: String,
    /// The submitted value, or `None` if the question was skipped.
    pub submitted: Option<String>,
    pub correct: bool,
    /// Points awarded (zero unless correct).
    pub awarded: u32,
    pub possible: u32,
}

fn percentage(earned: u32, possible: u32) -> f64 {
    if possible == 0 {
        0.0
    } else {
        f64::from(earned) / f64::from(possible) * 100.0
    }
}

/// Check the referential integrity the calculator relies on.
///
/// Validation is the primary guard; this only catches callers that skipped it.
fn check_integrity(test: &Test, attempt: &TestAttempt) -> Result<(), ScoringError> {
    if test.checked_max_points().is_none() {
        return Err(ScoringError::InvalidInput(format!(
            "test '{}' has a total point value above {}",
            test.id,
            u32::MAX
        )));
    }

    if attempt.test_id != test.id {
        return Err(ScoringError::InvalidInput(format!(
            "attempt {} targets test '{}', not '{}'",
            attempt.id, attempt.test_id, test.id
        )));
    }

    let mut seen = HashSet::new();
    for answer in &attempt.answers {
        if test.find_question(&answer.question_id).is_none() {
            return Err(ScoringError::MissingQuestionReference {
                test_id: test.id.clone(),
                question_id: answer.question_id.clone(),
            });
        }
        if !seen.insert(answer.question_id.as_str()) {
            return Err(ScoringError::InvalidInput(format!(
                "question {} is answered more than once",
                answer.question_id
            )));
        }
    }
    Ok(())
}

/// Score an attempt against its test.
///
/// The caller must have run [`crate::validation::validate_test`] and
/// [`crate::validation::validate_test_attempt`] first. Unanswered questions
/// score zero; they are not an error.
pub fn score_attempt(test: &Test, attempt: &TestAttempt) -> Result<TestResult, ScoringError> {
    check_integrity(test, attempt)?;

    let answers: HashMap<&str, &str> = attempt
        .answers
        .iter()
        .map(|a| (a.question_id.as_str(), a.value.as_str()))
        .collect();

    let mut sections = Vec::with_capacity(test.sections.len());
    let mut questions = Vec::with_capacity(test.question_count());
    let mut topics: BTreeMap<String, Performance> = BTreeMap::new();
    let mut skills: BTreeMap<String, Performance> = BTreeMap::new();

    for section in &test.sections {
        let mut earned = 0u32;
        let mut correct_count = 0u32;
        let mut answered = 0u32;

        for question in &section.questions {
            let submitted = answers.get(question.id.as_str()).copied();
            let correct = submitted
                .is_some_and(|value| answers_match(&question.correct, value, question.kind));
            let awarded = if correct { question.points } else { 0 };

            if submitted.is_some_and(|v| !v.trim().is_empty()) {
                answered += 1;
            }
            if correct {
                earned += awarded;
                correct_count += 1;
            }

            topics
                .entry(question.topic.clone())
                .or_default()
                .record(question.points, correct);
            skills
                .entry(question.skill.clone())
                .or_default()
                .record(question.points, correct);

            questions.push(QuestionOutcome {
                question_id: question.id.clone(),
                section_id: section.id.clone(),
                submitted: submitted.map(str::to_string),
                correct,
                awarded,
                possible: question.points,
            });
        }

        let possible = section.max_points();
        sections.push(SectionScore {
            section_id: section.id.clone(),
            subject: section.subject,
            earned,
            possible,
            correct: correct_count,
            answered,
            total: section.questions.len() as u32,
            scaled: scale_section(earned, possible, section.scale.as_ref()),
        });
    }

    let scaled: Vec<u32> = sections.iter().map(|s| s.scaled).collect();
    let (min_scaled, max_scaled) = test.overall_rule.range(sections.len());
    let overall = OverallScore {
        earned: sections.iter().map(|s| s.earned).sum(),
        possible: sections.iter().map(|s| s.possible).sum(),
        scaled: test.overall_rule.combine(&scaled),
        min_scaled,
        max_scaled,
    };

    tracing::debug!(
        test = %test.id,
        attempt = %attempt.id,
        earned = overall.earned,
        possible = overall.possible,
        scaled = overall.scaled,
        "scored attempt"
    );

    Ok(TestResult {
        test_id: test.id.clone(),
        attempt_id: attempt.id.clone(),
        overall,
        sections,
        topics: topics.into_iter().map(|(k, v)| (k, v.finish())).collect(),
        skills: skills.into_iter().map(|(k, v)| (k, v.finish())).collect(),
        questions,
    })
}
