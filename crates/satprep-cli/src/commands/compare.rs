//! The `satprep compare` command.

use std::path::PathBuf;

use anyhow::Result;

use satprep_core::report::{AreaChange, ScoreReport};

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = ScoreReport::load_json(&baseline_path)?;
    let current = ScoreReport::load_json(&current_path)?;

    if baseline.test.id != current.test.id {
        eprintln!(
            "Warning: comparing different tests ({} vs {})",
            baseline.test.id, current.test.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Scaled score: {} -> {} ({:+})",
                report.baseline_scaled,
                report.current_scaled,
                report.scaled_delta()
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            print_changes("Regressions", &report.regressions);
            print_changes("Improvements", &report.improvements);

            if report.new_areas > 0 {
                println!("\n{} new area(s)", report.new_areas);
            }
            if report.removed_areas > 0 {
                println!("{} removed area(s)", report.removed_areas);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_changes(title: &str, changes: &[AreaChange]) {
    if changes.is_empty() {
        return;
    }
    println!("\n{title}:");
    for c in changes {
        println!(
            "  {} {:.1}% -> {:.1}% ({:+.1})",
            c.area, c.baseline_percentage, c.current_percentage, c.delta
        );
    }
}
