//! Core data model types for satprep.
//!
//! These are the fundamental types that the entire satprep system uses
//! to represent tests, sections, questions, and student attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scale::{OverallRule, ScaleTable};

/// A complete practice test definition.
///
/// Authored externally and treated as read-only input once published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    /// Unique identifier for this test.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// The scored sections, in presentation order.
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Descriptive metadata.
    #[serde(default)]
    pub metadata: TestMetadata,
    /// How section scaled scores combine into the overall score.
    #[serde(default)]
    pub overall_rule: OverallRule,
}

impl Test {
    /// Total number of questions across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Maximum achievable raw points, saturating at `u32::MAX`.
    pub fn max_points(&self) -> u32 {
        self.checked_max_points().unwrap_or(u32::MAX)
    }

    /// Maximum achievable raw points, or `None` if the total does not fit in
    /// a `u32`.
    pub fn checked_max_points(&self) -> Option<u32> {
        self.sections
            .iter()
            .try_fold(0u32, |acc, s| acc.checked_add(s.checked_max_points()?))
    }

    /// Find a question by id, along with its owning section.
    pub fn find_question(&self, question_id: &str) -> Option<(&Section, &Question)> {
        self.sections.iter().find_map(|s| {
            s.questions
                .iter()
                .find(|q| q.id == question_id)
                .map(|q| (s, q))
        })
    }

    /// Iterate over every question in test order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }
}

/// Descriptive test metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestMetadata {
    /// Intended difficulty.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Subjects covered by this test.
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// A scored subdivision of a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique identifier within the test.
    pub id: String,
    /// Subject area of the section.
    pub subject: Subject,
    /// Questions in presentation order.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Time allocation in minutes.
    pub time_limit_minutes: u32,
    /// Optional raw-to-scaled conversion table.
    #[serde(default)]
    pub scale: Option<ScaleTable>,
}

impl Section {
    /// Maximum achievable raw points in this section, saturating at `u32::MAX`.
    pub fn max_points(&self) -> u32 {
        self.checked_max_points().unwrap_or(u32::MAX)
    }

    pub fn checked_max_points(&self) -> Option<u32> {
        self.questions
            .iter()
            .try_fold(0u32, |acc, q| acc.checked_add(q.points))
    }
}

/// A single question, owned by exactly one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the test.
    pub id: String,
    /// How submitted answers are compared.
    #[serde(default)]
    pub kind: QuestionType,
    /// The accepted answer(s).
    pub correct: AnswerKey,
    /// Topic tag (e.g. "linear-equations").
    pub topic: String,
    /// Skill tag (e.g. "algebra").
    pub skill: String,
    /// Points awarded for a correct answer.
    #[serde(default = "default_points")]
    pub points: u32,
    /// Number of answer choices for multiple-choice questions.
    #[serde(default)]
    pub choices: Option<u8>,
}

fn default_points() -> u32 {
    1
}

/// Question answer formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Lettered choices, compared case-insensitively.
    #[default]
    MultipleChoice,
    /// Student-produced numeric response.
    GridIn,
    /// Short text, compared case- and whitespace-insensitively.
    FreeResponse,
    /// Byte-exact comparison.
    Exact,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::GridIn => write!(f, "grid_in"),
            QuestionType::FreeResponse => write!(f, "free_response"),
            QuestionType::Exact => write!(f, "exact"),
        }
    }
}

/// The accepted answer(s) for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    /// A single accepted value.
    Single(String),
    /// Any of these values is accepted.
    AnyOf(Vec<String>),
}

impl AnswerKey {
    /// All accepted values.
    pub fn values(&self) -> &[String] {
        match self {
            AnswerKey::Single(v) => std::slice::from_ref(v),
            AnswerKey::AnyOf(vs) => vs,
        }
    }
}

impl From<&str> for AnswerKey {
    fn from(value: &str) -> Self {
        AnswerKey::Single(value.to_string())
    }
}

/// Subjects covered by SAT-style sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Math,
    ReadingWriting,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Math => write!(f, "math"),
            Subject::ReadingWriting => write!(f, "reading_writing"),
        }
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "math" | "maths" => Ok(Subject::Math),
            "reading_writing" | "reading-writing" | "rw" | "ebrw" => Ok(Subject::ReadingWriting),
            other => Err(format!("unknown subject: {other}")),
        }
    }
}

/// Intended test difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One student's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAnswer {
    /// The question this answers, by id.
    pub question_id: String,
    /// The raw submitted value.
    pub value: String,
    /// When the answer was recorded.
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
    /// Whether the student flagged the question for review.
    #[serde(default)]
    pub flagged: bool,
}

impl StudentAnswer {
    pub fn new(question_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
            answered_at: None,
            flagged: false,
        }
    }
}

/// Lifecycle state of an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    #[default]
    InProgress,
    Submitted,
}

/// One student's submission against a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAttempt {
    /// Unique attempt identifier.
    pub id: String,
    /// The test this attempt answers.
    pub test_id: String,
    /// Owner, as resolved by the request layer.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Submitted answers, at most one per question.
    #[serde(default)]
    pub answers: Vec<StudentAnswer>,
    #[serde(default)]
    pub status: AttemptStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl TestAttempt {
    /// The first answer recorded for a question, if any.
    pub fn answer_for(&self, question_id: &str) -> Option<&StudentAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    pub fn is_submitted(&self) -> bool {
        self.status == AttemptStatus::Submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_display_and_parse() {
        assert_eq!(Subject::Math.to_string(), "math");
        assert_eq!(Subject::ReadingWriting.to_string(), "reading_writing");
        assert_eq!("Math".parse::<Subject>().unwrap(), Subject::Math);
        assert_eq!("rw".parse::<Subject>().unwrap(), Subject::ReadingWriting);
        assert_eq!(
            "reading-writing".parse::<Subject>().unwrap(),
            Subject::ReadingWriting
        );
        assert!("science".parse::<Subject>().is_err());
    }

    #[test]
    fn answer_key_deserializes_single_or_list() {
        let single: AnswerKey = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(single.values(), ["B".to_string()]);

        let many: AnswerKey = serde_json::from_str(r#"["1/2", "0.5"]"#).unwrap();
        assert_eq!(many.values().len(), 2);
    }

    #[test]
    fn question_defaults() {
        let q: Question = serde_json::from_str(
            r#"{"id": "q1", "correct": "A", "topic": "t", "skill": "s"}"#,
        )
        .unwrap();
        assert_eq!(q.kind, QuestionType::MultipleChoice);
        assert_eq!(q.points, 1);
        assert!(q.choices.is_none());
    }

    #[test]
    fn attempt_lookup_and_status() {
        let attempt = TestAttempt {
            id: "a1".into(),
            test_id: "t1".into(),
            user_id: None,
            answers: vec![StudentAnswer::new("q1", "B")],
            status: AttemptStatus::Submitted,
            started_at: None,
            submitted_at: None,
        };
        assert!(attempt.is_submitted());
        assert_eq!(attempt.answer_for("q1").unwrap().value, "B");
        assert!(attempt.answer_for("q2").is_none());
    }
}
