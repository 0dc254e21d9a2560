//! Structural validation of tests and attempts.
//!
//! Every check runs; problems are accumulated rather than short-circuited so
//! callers can report all of them at once.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionType, Test, TestAttempt};
use crate::normalizer::{normalize_choice, parse_grid_in};

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// Problems in discovery order.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors with the given code.
    pub fn with_code(&self, code: ValidationCode) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.code == code)
    }
}

/// A single structural problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ValidationCode,
    /// Human-readable description.
    pub message: String,
    /// The entity the problem was found on.
    pub entity: EntityRef,
}

/// Machine-readable validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    EmptyTest,
    EmptySection,
    MalformedAnswerKey,
    DuplicateQuestionId,
    DuplicateSectionId,
    NonPositiveTimeLimit,
    ZeroPointValue,
    InvalidScaleTable,
    TestIdMismatch,
    UnknownQuestion,
    DuplicateAnswer,
    NotSubmitted,
    PointTotalOverflow,
}

impl ValidationCode {
    /// The stable snake_case name used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::EmptyTest => "empty_test",
            ValidationCode::EmptySection => "empty_section",
            ValidationCode::MalformedAnswerKey => "malformed_answer_key",
            ValidationCode::DuplicateQuestionId => "duplicate_question_id",
            ValidationCode::DuplicateSectionId => "duplicate_section_id",
            ValidationCode::NonPositiveTimeLimit => "non_positive_time_limit",
            ValidationCode::ZeroPointValue => "zero_point_value",
            ValidationCode::InvalidScaleTable => "invalid_scale_table",
            ValidationCode::TestIdMismatch => "test_id_mismatch",
            ValidationCode::UnknownQuestion => "unknown_question",
            ValidationCode::DuplicateAnswer => "duplicate_answer",
            ValidationCode::NotSubmitted => "not_submitted",
            ValidationCode::PointTotalOverflow => "point_total_overflow",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the entity a validation error concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Test(String),
    Section(String),
    Question(String),
    Attempt(String),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Test(id) => write!(f, "test {id}"),
            EntityRef::Section(id) => write!(f, "section {id}"),
            EntityRef::Question(id) => write!(f, "question {id}"),
            EntityRef::Attempt(id) => write!(f, "attempt {id}"),
        }
    }
}

fn error(code: ValidationCode, entity: EntityRef, message: impl Into<String>) -> ValidationError {
    ValidationError {
        code,
        message: message.into(),
        entity,
    }
}

/// Validate the structural integrity of a test definition.
pub fn validate_test(test: &Test) -> ValidationResult {
    let mut errors = Vec::new();

    if test.sections.is_empty() {
        errors.push(error(
            ValidationCode::EmptyTest,
            EntityRef::Test(test.id.clone()),
            "test has no sections",
        ));
    }

    if test.checked_max_points().is_none() {
        errors.push(error(
            ValidationCode::PointTotalOverflow,
            EntityRef::Test(test.id.clone()),
            format!("total point value exceeds {}", u32::MAX),
        ));
    }

    let mut seen_sections = HashSet::new();
    let mut seen_questions = HashSet::new();

    for section in &test.sections {
        let section_ref = || EntityRef::Section(section.id.clone());

        if !seen_sections.insert(section.id.as_str()) {
            errors.push(error(
                ValidationCode::DuplicateSectionId,
                section_ref(),
                format!("duplicate section ID: {}", section.id),
            ));
        }

        if section.questions.is_empty() {
            errors.push(error(
                ValidationCode::EmptySection,
                section_ref(),
                "section has no questions",
            ));
        }

        if section.time_limit_minutes == 0 {
            errors.push(error(
                ValidationCode::NonPositiveTimeLimit,
                section_ref(),
                "section time allocation must be positive",
            ));
        }

        if let (Some(table), Some(max_raw)) = (&section.scale, section.checked_max_points()) {
            if let Some(problem) = table.check(max_raw) {
                errors.push(error(ValidationCode::InvalidScaleTable, section_ref(), problem));
            }
        }

        for question in &section.questions {
            let question_ref = || EntityRef::Question(question.id.clone());

            if !seen_questions.insert(question.id.as_str()) {
                errors.push(error(
                    ValidationCode::DuplicateQuestionId,
                    question_ref(),
                    format!("duplicate question ID: {}", question.id),
                ));
            }

            if question.points == 0 {
                errors.push(error(
                    ValidationCode::ZeroPointValue,
                    question_ref(),
                    "question is worth zero points",
                ));
            }

            if let Some(problem) = answer_key_problem(question) {
                errors.push(error(ValidationCode::MalformedAnswerKey, question_ref(), problem));
            }
        }
    }

    ValidationResult::from_errors(errors)
}

/// Describe why a question's answer key is malformed, if it is.
fn answer_key_problem(question: &Question) -> Option<String> {
    let values = question.correct.values();
    if values.is_empty() {
        return Some("answer key lists no accepted values".into());
    }
    for value in values {
        if value.trim().is_empty() {
            return Some("answer key contains a blank value".into());
        }
        match question.kind {
            QuestionType::MultipleChoice => {
                let Some(letter) = normalize_choice(value) else {
                    return Some(format!("'{value}' is not a choice letter"));
                };
                if let Some(choices) = question.choices {
                    let index = (letter as u8 - b'A') + 1;
                    if index > choices {
                        return Some(format!(
                            "choice '{letter}' is outside the {choices} available choices"
                        ));
                    }
                }
            }
            QuestionType::GridIn => {
                if parse_grid_in(value).is_none() {
                    return Some(format!("'{value}' is not a valid grid-in number"));
                }
            }
            QuestionType::FreeResponse | QuestionType::Exact => {}
        }
    }
    None
}

/// Validate an attempt against the test it claims to answer.
pub fn validate_test_attempt(test: &Test, attempt: &TestAttempt) -> ValidationResult {
    let mut errors = Vec::new();
    let attempt_ref = || EntityRef::Attempt(attempt.id.clone());

    if attempt.test_id != test.id {
        errors.push(error(
            ValidationCode::TestIdMismatch,
            attempt_ref(),
            format!(
                "attempt targets test '{}' but was checked against '{}'",
                attempt.test_id, test.id
            ),
        ));
    }

    let known: HashSet<&str> = test.questions().map(|q| q.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut reported_duplicates = HashSet::new();

    for answer in &attempt.answers {
        let id = answer.question_id.as_str();
        if !known.contains(id) {
            errors.push(error(
                ValidationCode::UnknownQuestion,
                EntityRef::Question(answer.question_id.clone()),
                format!("answer references unknown question: {id}"),
            ));
        }
        if !seen.insert(id) && reported_duplicates.insert(id) {
            errors.push(error(
                ValidationCode::DuplicateAnswer,
                EntityRef::Question(answer.question_id.clone()),
                format!("question {id} is answered more than once"),
            ));
        }
    }

    if !attempt.is_submitted() {
        errors.push(error(
            ValidationCode::NotSubmitted,
            attempt_ref(),
            "attempt has not been submitted",
        ));
    }

    ValidationResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::scale::{ScalePoint, ScaleTable};

    fn question(id: &str, kind: QuestionType, correct: &str) -> Question {
        Question {
            id: id.into(),
            kind,
            correct: AnswerKey::from(correct),
            topic: "algebra".into(),
            skill: "linear-equations".into(),
            points: 1,
            choices: Some(4),
        }
    }

    fn sample_test() -> Test {
        Test {
            id: "t1".into(),
            title: "Practice 1".into(),
            sections: vec![Section {
                id: "math".into(),
                subject: Subject::Math,
                questions: vec![
                    question("q1", QuestionType::MultipleChoice, "B"),
                    question("q2", QuestionType::GridIn, "1/2"),
                ],
                time_limit_minutes: 35,
                scale: None,
            }],
            metadata: TestMetadata::default(),
            overall_rule: Default::default(),
        }
    }

    fn attempt(answers: &[(&str, &str)]) -> TestAttempt {
        TestAttempt {
            id: "a1".into(),
            test_id: "t1".into(),
            user_id: Some("u1".into()),
            answers: answers
                .iter()
                .map(|(q, v)| StudentAnswer::new(*q, *v))
                .collect(),
            status: AttemptStatus::Submitted,
            started_at: None,
            submitted_at: None,
        }
    }

    #[test]
    fn valid_test_passes() {
        let result = validate_test(&sample_test());
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn empty_section_is_reported() {
        let mut test = sample_test();
        test.sections.push(Section {
            id: "rw".into(),
            subject: Subject::ReadingWriting,
            questions: vec![],
            time_limit_minutes: 32,
            scale: None,
        });
        let result = validate_test(&test);
        assert!(!result.valid);
        let err = result.with_code(ValidationCode::EmptySection).next().unwrap();
        assert_eq!(err.message, "section has no questions");
        assert_eq!(err.entity, EntityRef::Section("rw".into()));
    }

    #[test]
    fn accumulates_every_problem() {
        let mut test = sample_test();
        let section = &mut test.sections[0];
        section.time_limit_minutes = 0;
        section.questions.push(question("q1", QuestionType::GridIn, "abc"));
        section.questions[1].points = 0;

        let result = validate_test(&test);
        assert!(!result.valid);
        let codes: Vec<_> = result.errors.iter().map(|e| e.code).collect();
        assert!(codes.contains(&ValidationCode::NonPositiveTimeLimit));
        assert!(codes.contains(&ValidationCode::DuplicateQuestionId));
        assert!(codes.contains(&ValidationCode::MalformedAnswerKey));
        assert!(codes.contains(&ValidationCode::ZeroPointValue));
    }

    #[test]
    fn malformed_answer_keys() {
        let mut test = sample_test();
        test.sections[0].questions = vec![
            question("mc-out-of-range", QuestionType::MultipleChoice, "E"),
            question("mc-word", QuestionType::MultipleChoice, "banana"),
            question("blank", QuestionType::FreeResponse, "  "),
            Question {
                correct: AnswerKey::AnyOf(vec![]),
                ..question("empty", QuestionType::Exact, "x")
            },
        ];
        let result = validate_test(&test);
        assert_eq!(result.with_code(ValidationCode::MalformedAnswerKey).count(), 4);
    }

    #[test]
    fn bad_scale_table_is_reported() {
        let mut test = sample_test();
        test.sections[0].scale = Some(ScaleTable {
            points: vec![
                ScalePoint { raw: 0, scaled: 200 },
                ScalePoint { raw: 5, scaled: 800 },
            ],
        });
        let result = validate_test(&test);
        assert_eq!(result.with_code(ValidationCode::InvalidScaleTable).count(), 1);
    }

    #[test]
    fn point_totals_beyond_u32_are_rejected() {
        let mut test = sample_test();
        test.sections[0].questions[0].points = 3_000_000_000;
        test.sections[0].questions[1].points = 3_000_000_000;
        test.sections[0].scale = Some(ScaleTable {
            points: vec![
                ScalePoint { raw: 0, scaled: 200 },
                ScalePoint { raw: 2, scaled: 800 },
            ],
        });

        let result = validate_test(&test);
        assert!(!result.valid);
        let err = result.with_code(ValidationCode::PointTotalOverflow).next().unwrap();
        assert_eq!(err.entity, EntityRef::Test("t1".into()));
        assert_eq!(test.checked_max_points(), None);
        assert_eq!(test.max_points(), u32::MAX);
    }

    #[test]
    fn empty_test_is_reported() {
        let mut test = sample_test();
        test.sections.clear();
        let result = validate_test(&test);
        assert!(!result.valid);
        assert_eq!(result.errors[0].code, ValidationCode::EmptyTest);
    }

    #[test]
    fn valid_attempt_is_idempotent() {
        let test = sample_test();
        let attempt = attempt(&[("q1", "b"), ("q2", "0.5")]);
        let first = validate_test_attempt(&test, &attempt);
        let second = validate_test_attempt(&test, &attempt);
        assert!(first.valid);
        assert!(first.errors.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_answer_references_question() {
        let test = sample_test();
        let result = validate_test_attempt(&test, &attempt(&[("q1", "B"), ("q1", "C")]));
        assert!(!result.valid);
        let dup = result.with_code(ValidationCode::DuplicateAnswer).next().unwrap();
        assert_eq!(dup.entity, EntityRef::Question("q1".into()));
    }

    #[test]
    fn triple_answer_reported_once() {
        let test = sample_test();
        let result =
            validate_test_attempt(&test, &attempt(&[("q1", "B"), ("q1", "C"), ("q1", "D")]));
        assert_eq!(result.with_code(ValidationCode::DuplicateAnswer).count(), 1);
    }

    #[test]
    fn unknown_question_mismatch_and_status() {
        let test = sample_test();
        let mut attempt = attempt(&[("q7", "B")]);
        attempt.test_id = "other".into();
        attempt.status = AttemptStatus::InProgress;

        let result = validate_test_attempt(&test, &attempt);
        let codes: Vec<_> = result.errors.iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                ValidationCode::TestIdMismatch,
                ValidationCode::UnknownQuestion,
                ValidationCode::NotSubmitted,
            ]
        );
    }

    #[test]
    fn missing_answers_are_not_an_error() {
        let test = sample_test();
        assert!(validate_test_attempt(&test, &attempt(&[])).valid);
    }

    #[test]
    fn validation_result_serializes_codes_in_snake_case() {
        let result = validate_test_attempt(&sample_test(), &attempt(&[("q1", "B"), ("q1", "B")]));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["errors"][0]["code"], "duplicate_answer");
        assert_eq!(json["errors"][0]["entity"]["kind"], "question");
        assert_eq!(
            json["errors"][0]["code"],
            ValidationCode::DuplicateAnswer.to_string()
        );
    }
}
