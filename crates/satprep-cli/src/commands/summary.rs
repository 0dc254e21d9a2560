//! Console rendering shared by several commands.

use comfy_table::{Cell, Table};

use satprep_core::report::ScoreReport;
use satprep_core::validation::ValidationResult;

/// Print each validation error on its own line.
pub fn print_validation(result: &ValidationResult) {
    for e in &result.errors {
        println!("  [{}] {}: {}", e.entity, e.code, e.message);
    }
}

/// Render a score report as tables.
pub fn score_table(report: &ScoreReport) -> String {
    let result = &report.result;
    let mut out = format!(
        "{} ({})\nAttempt {}: {} (range {}-{}), {}/{} raw points\n",
        report.test.title,
        report.test.id,
        result.attempt_id,
        result.overall.scaled,
        result.overall.min_scaled,
        result.overall.max_scaled,
        result.overall.earned,
        result.overall.possible,
    );

    let mut sections = Table::new();
    sections.set_header(vec!["Section", "Subject", "Correct", "Raw", "%", "Scaled"]);
    for s in &result.sections {
        sections.add_row(vec![
            Cell::new(&s.section_id),
            Cell::new(s.subject),
            Cell::new(format!("{}/{}", s.correct, s.total)),
            Cell::new(format!("{}/{}", s.earned, s.possible)),
            Cell::new(format!("{:.1}%", s.percentage())),
            Cell::new(s.scaled),
        ]);
    }
    out.push_str(&format!("\n{sections}\n"));

    if !result.topics.is_empty() {
        let mut topics = Table::new();
        topics.set_header(vec!["Topic", "Correct", "%"]);
        for (topic, perf) in &result.topics {
            topics.add_row(vec![
                Cell::new(topic),
                Cell::new(format!("{}/{}", perf.correct, perf.total)),
                Cell::new(format!("{:.1}%", perf.percentage)),
            ]);
        }
        out.push_str(&format!("\n{topics}\n"));
    }

    out
}

/// One row per graded attempt.
pub fn batch_table(reports: &[ScoreReport]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Attempt", "Test", "Student", "Raw", "Scaled"]);
    for r in reports {
        table.add_row(vec![
            Cell::new(&r.result.attempt_id),
            Cell::new(&r.result.test_id),
            Cell::new(r.user_id.as_deref().unwrap_or("-")),
            Cell::new(format!(
                "{}/{}",
                r.result.overall.earned, r.result.overall.possible
            )),
            Cell::new(r.result.overall.scaled),
        ]);
    }
    table
}
