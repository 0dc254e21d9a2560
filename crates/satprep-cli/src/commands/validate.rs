//! The `satprep validate` command.

use std::path::PathBuf;

use anyhow::Result;

use satprep_core::parser;
use satprep_core::validation::{validate_test, validate_test_attempt};

use super::summary::print_validation;

pub fn execute(test_path: PathBuf, attempt_path: Option<PathBuf>) -> Result<()> {
    let tests = if test_path.is_dir() {
        parser::load_test_directory(&test_path)?
    } else {
        vec![parser::parse_test(&test_path)?]
    };
    anyhow::ensure!(!tests.is_empty(), "no tests found in {}", test_path.display());

    let mut total_errors = 0;

    for test in &tests {
        println!("Test: {} ({} questions)", test.id, test.question_count());
        let result = validate_test(test);
        print_validation(&result);
        total_errors += result.errors.len();
    }

    if let Some(path) = attempt_path {
        let attempt = parser::load_attempt(&path)?;
        let Some(test) = tests.iter().find(|t| t.id == attempt.test_id) else {
            anyhow::bail!(
                "attempt {} references test '{}', which is not in {}",
                attempt.id,
                attempt.test_id,
                test_path.display()
            );
        };

        println!("Attempt: {} ({} answers)", attempt.id, attempt.answers.len());
        let result = validate_test_attempt(test, &attempt);
        print_validation(&result);
        total_errors += result.errors.len();
    }

    if total_errors > 0 {
        anyhow::bail!("{total_errors} validation error(s) found");
    }

    println!("All valid.");
    Ok(())
}
