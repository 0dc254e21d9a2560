//! The `satprep grade` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use satprep_core::engine::{GradingConfig, GradingEngine, ProgressReporter};
use satprep_core::parser;
use satprep_core::report::ScoreReport;
use satprep_core::GradingError;
use satprep_store::config::load_config_from;
use satprep_store::create_store;

use super::summary::{batch_table, print_validation};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_grade_start(&self, attempt_id: &str) {
        eprintln!("  Grading: {attempt_id}");
    }

    fn on_grade_complete(&self, report: &ScoreReport) {
        eprintln!(
            "  Done: {} :: {} scaled {} ({}/{})",
            report.result.attempt_id,
            report.result.test_id,
            report.result.overall.scaled,
            report.result.overall.earned,
            report.result.overall.possible,
        );
    }

    fn on_grade_error(&self, attempt_id: &str, error: &GradingError) {
        eprintln!("  ERROR: {attempt_id}: {error}");
        if let GradingError::Validation(result) = error {
            print_validation(result);
        }
    }

    fn on_batch_complete(&self, total: usize, graded: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {graded}/{total} graded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    attempts_path: PathBuf,
    config_path: Option<PathBuf>,
    store_name: Option<String>,
    parallelism: Option<usize>,
) -> Result<()> {
    if let Some(p) = parallelism {
        anyhow::ensure!(p >= 1, "parallelism must be at least 1");
    }

    let config = load_config_from(config_path.as_deref())?;
    let (name, store_config) = config.store(store_name.as_deref())?;
    tracing::debug!(?store_config, "using store '{name}'");
    let store = create_store(&name, &store_config)?;

    let attempts = if attempts_path.is_dir() {
        parser::load_attempt_directory(&attempts_path)?
    } else {
        vec![parser::load_attempt(&attempts_path)?]
    };
    anyhow::ensure!(
        !attempts.is_empty(),
        "no attempts found in {}",
        attempts_path.display()
    );

    let engine = GradingEngine::new(
        store,
        GradingConfig {
            parallelism: parallelism.unwrap_or(config.parallelism),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            persist: true,
        },
    );

    eprintln!(
        "satprep v{}: grading {} attempt(s) via store '{name}'\n",
        env!("CARGO_PKG_VERSION"),
        attempts.len()
    );

    let outcome = engine.grade_batch(&attempts, &ConsoleReporter).await;

    if !outcome.reports.is_empty() {
        println!("{}", batch_table(&outcome.reports));
    }

    if !outcome.failures.is_empty() {
        anyhow::bail!("{} attempt(s) could not be graded", outcome.failures.len());
    }
    Ok(())
}
