//! Test definition and attempt loaders.
//!
//! Tests are authored as TOML files; attempts arrive as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, Question, Section, Subject, Test, TestAttempt, TestMetadata};
use crate::scale::{OverallRule, ScaleTable};

/// Intermediate TOML structure for parsing test files.
#[derive(Debug, Deserialize)]
struct TomlTestFile {
    test: TomlTestHeader,
    #[serde(default)]
    sections: Vec<TomlSection>,
}

#[derive(Debug, Deserialize)]
struct TomlTestHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default)]
    overall_rule: OverallRule,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    id: String,
    subject: String,
    time_limit_minutes: u32,
    #[serde(default)]
    scale: Option<ScaleTable>,
    #[serde(default)]
    questions: Vec<Question>,
}

/// Parse a single TOML file into a `Test`.
pub fn parse_test(path: &Path) -> Result<Test> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file: {}", path.display()))?;

    parse_test_str(&content, path)
}

/// Parse a TOML string into a `Test` (useful for testing).
pub fn parse_test_str(content: &str, source_path: &Path) -> Result<Test> {
    let parsed: TomlTestFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let sections = parsed
        .sections
        .into_iter()
        .map(|s| {
            let subject: Subject = s
                .subject
                .parse()
                .map_err(|e: String| anyhow::anyhow!("section {}: {}", s.id, e))?;
            Ok(Section {
                id: s.id,
                subject,
                questions: s.questions,
                time_limit_minutes: s.time_limit_minutes,
                scale: s.scale,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut subjects: Vec<Subject> = sections.iter().map(|s| s.subject).collect();
    subjects.sort();
    subjects.dedup();

    Ok(Test {
        id: parsed.test.id,
        title: parsed.test.title,
        sections,
        metadata: TestMetadata {
            difficulty: parsed.test.difficulty,
            subjects,
            description: parsed.test.description,
        },
        overall_rule: parsed.test.overall_rule,
    })
}

/// Recursively load all `.toml` test files from a directory.
pub fn load_test_directory(dir: &Path) -> Result<Vec<Test>> {
    let mut tests = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            tests.extend(load_test_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_test(&path) {
                Ok(test) => tests.push(test),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    tests.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(tests)
}

/// Load a single JSON attempt.
pub fn load_attempt(path: &Path) -> Result<TestAttempt> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempt file: {}", path.display()))?;
    parse_attempt_str(&content, path)
}

/// Parse a JSON attempt from a string.
pub fn parse_attempt_str(content: &str, source_path: &Path) -> Result<TestAttempt> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse attempt JSON: {}", source_path.display()))
}

/// Load every `.json` attempt in a directory (non-recursive).
pub fn load_attempt_directory(dir: &Path) -> Result<Vec<TestAttempt>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut attempts = Vec::with_capacity(paths.len());
    for path in paths {
        match load_attempt(&path) {
            Ok(attempt) => attempts.push(attempt),
            Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
        }
    }
    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKey, AttemptStatus, QuestionType};
    use crate::validation::validate_test;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[test]
id = "practice-1"
title = "Practice Test 1"
description = "Short diagnostic"
difficulty = "medium"

[[sections]]
id = "math"
subject = "math"
time_limit_minutes = 35

[[sections.questions]]
id = "m1"
kind = "multiple_choice"
correct = "B"
choices = 4
topic = "linear-equations"
skill = "algebra"

[[sections.questions]]
id = "m2"
kind = "grid_in"
correct = ["1/2", "0.5"]
topic = "ratios"
skill = "problem-solving"
points = 2

[[sections]]
id = "rw"
subject = "reading-writing"
time_limit_minutes = 32
scale = { points = [{ raw = 0, scaled = 200 }, { raw = 1, scaled = 800 }] }

[[sections.questions]]
id = "r1"
correct = "D"
topic = "transitions"
skill = "expression-of-ideas"
"#;

    #[test]
    fn parse_valid_toml() {
        let test = parse_test_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(test.id, "practice-1");
        assert_eq!(test.sections.len(), 2);
        assert_eq!(test.sections[1].subject, Subject::ReadingWriting);
        assert_eq!(test.metadata.difficulty, Some(Difficulty::Medium));
        assert_eq!(
            test.metadata.subjects,
            vec![Subject::Math, Subject::ReadingWriting]
        );

        let m2 = &test.sections[0].questions[1];
        assert_eq!(m2.kind, QuestionType::GridIn);
        assert_eq!(m2.points, 2);
        assert!(matches!(m2.correct, AnswerKey::AnyOf(ref v) if v.len() == 2));

        let r1 = &test.sections[1].questions[0];
        assert_eq!(r1.kind, QuestionType::MultipleChoice);
        assert_eq!(test.sections[1].scale.as_ref().unwrap().points.len(), 2);

        assert!(validate_test(&test).valid);
    }

    #[test]
    fn parse_unknown_subject() {
        let toml = r#"
[test]
id = "bad"
title = "Bad"

[[sections]]
id = "sci"
subject = "science"
time_limit_minutes = 10
"#;
        let err = parse_test_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown subject"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_test_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "nope = [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tests = load_test_directory(dir.path()).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].id, "practice-1");
    }

    #[test]
    fn parse_attempt_json() {
        let json = r#"{
            "id": "a1",
            "test_id": "practice-1",
            "user_id": "student-7",
            "status": "submitted",
            "submitted_at": "2026-03-14T10:00:00Z",
            "answers": [
                { "question_id": "m1", "value": "b" },
                { "question_id": "m2", "value": "0.50", "flagged": true }
            ]
        }"#;
        let attempt = parse_attempt_str(json, &PathBuf::from("a1.json")).unwrap();
        assert_eq!(attempt.status, AttemptStatus::Submitted);
        assert_eq!(attempt.answers.len(), 2);
        assert!(attempt.answers[1].flagged);
        assert!(attempt.submitted_at.is_some());
    }

    #[test]
    fn load_attempt_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for id in ["b", "a"] {
            let json = format!(r#"{{"id": "{id}", "test_id": "t", "answers": []}}"#);
            std::fs::write(dir.path().join(format!("{id}.json")), json).unwrap();
        }
        let attempts = load_attempt_directory(dir.path()).unwrap();
        let ids: Vec<_> = attempts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(attempts[0].status, AttemptStatus::InProgress);
    }
}
