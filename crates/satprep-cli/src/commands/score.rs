//! The `satprep score` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use satprep_core::engine::{GradingConfig, GradingEngine};
use satprep_core::{parser, GradingError};
use satprep_report::html::write_html_report;
use satprep_store::MemoryStore;

use super::summary::{print_validation, score_table};

const DEFAULT_OUTPUT: &str = "satprep-results";

pub async fn execute(
    test_path: PathBuf,
    attempt_path: PathBuf,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let tests = if test_path.is_dir() {
        parser::load_test_directory(&test_path)?
    } else {
        vec![parser::parse_test(&test_path)?]
    };
    let attempt = parser::load_attempt(&attempt_path)?;

    // Scoring a local file never writes through a store.
    let engine = GradingEngine::new(
        Arc::new(MemoryStore::new(tests)),
        GradingConfig {
            persist: false,
            ..GradingConfig::default()
        },
    );

    let report = match engine.grade(&attempt).await {
        Ok(report) => report,
        Err(GradingError::Validation(result)) => {
            print_validation(&result);
            anyhow::bail!(
                "attempt {} failed validation with {} error(s)",
                attempt.id,
                result.errors.len()
            );
        }
        Err(e) => return Err(e.into()),
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "html" => {
            let dir = output.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
            let path = dir.join(format!("{}.html", report.result.attempt_id));
            write_html_report(&report, &path)?;
            eprintln!("HTML report: {}", path.display());
        }
        "text" => print!("{}", score_table(&report)),
        other => anyhow::bail!("unknown format: {other} (expected text, json, or html)"),
    }

    if let Some(dir) = output {
        let path = dir.join(format!("{}.json", report.result.attempt_id));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}
