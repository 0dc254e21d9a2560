//! The `satprep init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("satprep.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("tests/example.toml"), EXAMPLE_TEST)?;
    write_if_missing(Path::new("attempts/example.json"), EXAMPLE_ATTEMPT)?;

    println!("\nNext steps:");
    println!("  1. Run: satprep validate --test tests/example.toml --attempt attempts/example.json");
    println!("  2. Run: satprep score --test tests/example.toml --attempt attempts/example.json");
    println!("  3. Run: satprep grade --attempts attempts");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# satprep configuration

default_store = "local"
parallelism = 4
max_retries = 3
retry_delay_ms = 500
output_dir = "satprep-results"

[stores.local]
type = "file"
tests_dir = "tests"
results_dir = "satprep-results"

# [stores.remote]
# type = "http"
# base_url = "https://scores.example.com/api"
# token = "${SATPREP_STORE_TOKEN}"
"#;

const EXAMPLE_TEST: &str = r#"[test]
id = "example"
title = "Example Practice Test"
description = "A short two-section diagnostic"
difficulty = "easy"

[[sections]]
id = "rw-1"
subject = "reading-writing"
time_limit_minutes = 10

[[sections.questions]]
id = "rw-1-q1"
kind = "multiple_choice"
correct = "C"
choices = 4
topic = "words-in-context"
skill = "craft-and-structure"

[[sections.questions]]
id = "rw-1-q2"
kind = "multiple_choice"
correct = "A"
choices = 4
topic = "transitions"
skill = "expression-of-ideas"

[[sections.questions]]
id = "rw-1-q3"
kind = "free_response"
correct = "the author disagrees"
topic = "central-ideas"
skill = "information-and-ideas"

[[sections]]
id = "math-1"
subject = "math"
time_limit_minutes = 15
scale = { points = [{ raw = 0, scaled = 200 }, { raw = 1, scaled = 350 }, { raw = 3, scaled = 500 }, { raw = 5, scaled = 650 }, { raw = 6, scaled = 800 }] }

[[sections.questions]]
id = "math-1-q1"
kind = "multiple_choice"
correct = "B"
choices = 4
topic = "linear-equations"
skill = "algebra"

[[sections.questions]]
id = "math-1-q2"
kind = "grid_in"
correct = "3/4"
topic = "ratios"
skill = "problem-solving"
points = 2

[[sections.questions]]
id = "math-1-q3"
kind = "grid_in"
correct = ["2/3", ".666", ".667"]
topic = "ratios"
skill = "problem-solving"
points = 3
"#;

const EXAMPLE_ATTEMPT: &str = r#"{
  "id": "example-attempt-1",
  "test_id": "example",
  "user_id": "student-1",
  "status": "submitted",
  "answers": [
    { "question_id": "rw-1-q1", "value": "c" },
    { "question_id": "rw-1-q2", "value": "(B)" },
    { "question_id": "rw-1-q3", "value": "  The author   disagrees " },
    { "question_id": "math-1-q1", "value": "B" },
    { "question_id": "math-1-q2", "value": "0.75" }
  ]
}
"#;
