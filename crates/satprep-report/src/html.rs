//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use satprep_core::report::ScoreReport;
use satprep_core::scoring::{Performance, SectionScore};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a score report.
pub fn generate_html(report: &ScoreReport) -> String {
    let result = &report.result;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>satprep report: {}</title>\n",
        html_escape(&report.test.title)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.test.title)));
    html.push_str(&format!(
        "<p class=\"meta\">Attempt <strong>{}</strong>{} | {} sections | {} questions | {}</p>\n",
        html_escape(&result.attempt_id),
        report
            .user_id
            .as_deref()
            .map(|u| format!(" by {}", html_escape(u)))
            .unwrap_or_default(),
        report.test.section_count,
        report.test.question_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Overall score
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Score</h2>\n");
    html.push_str(&format!(
        "<p class=\"total\"><span class=\"scaled\">{}</span> <span class=\"range\">({}&ndash;{})</span></p>\n",
        result.overall.scaled, result.overall.min_scaled, result.overall.max_scaled
    ));
    html.push_str(&format!(
        "<p class=\"meta\">{} of {} raw points</p>\n",
        result.overall.earned, result.overall.possible
    ));

    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Section</th><th>Subject</th><th>Correct</th><th>Answered</th><th>Raw</th><th>%</th><th>Scaled</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &result.sections {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}/{}</td><td>{}/{}</td><td>{}/{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
            html_escape(&s.section_id),
            s.subject,
            s.correct,
            s.total,
            s.answered,
            s.total,
            s.earned,
            s.possible,
            s.percentage(),
            s.scaled,
        ));
    }
    html.push_str("</tbody></table>\n");

    if !result.sections.is_empty() {
        html.push_str(&generate_bar_chart(&result.sections));
    }
    html.push_str("</section>\n");

    html.push_str(&performance_table("Topics", "topics", &result.topics));
    html.push_str(&performance_table("Skills", "skills", &result.skills));

    // Per-question outcomes
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"questions\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable('questions', 0)\">Question</th><th onclick=\"sortTable('questions', 1)\">Section</th><th onclick=\"sortTable('questions', 2)\">Answer</th><th onclick=\"sortTable('questions', 3)\">Result</th><th onclick=\"sortTable('questions', 4)\">Points</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for q in &result.questions {
        let (class, text) = match (&q.submitted, q.correct) {
            (_, true) => ("pass", "correct"),
            (None, false) => ("skip", "omitted"),
            (Some(_), false) => ("fail", "incorrect"),
        };
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td>{text}</td><td>{}/{}</td></tr>\n",
            html_escape(&q.question_id),
            html_escape(&q.section_id),
            q.submitted.as_deref().map(html_escape).unwrap_or_else(|| "-".into()),
            q.awarded,
            q.possible,
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ScoreReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn performance_table(title: &str, id: &str, rows: &BTreeMap<String, Performance>) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut html = format!("<section class=\"breakdown\">\n<h2>{title}</h2>\n");
    html.push_str(&format!("<table class=\"results-table\" id=\"{id}\">\n"));
    html.push_str(&format!(
        "<thead><tr><th onclick=\"sortTable('{id}', 0)\">Name</th><th onclick=\"sortTable('{id}', 1)\">Correct</th><th onclick=\"sortTable('{id}', 2)\">Points</th><th onclick=\"sortTable('{id}', 3)\">%</th></tr></thead>\n"
    ));
    html.push_str("<tbody>\n");
    for (name, perf) in rows {
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}/{}</td><td>{}/{}</td><td>{:.1}%</td></tr>\n",
            band_class(perf.percentage),
            html_escape(name),
            perf.correct,
            perf.total,
            perf.earned,
            perf.possible,
            perf.percentage,
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");
    html
}

fn band_class(percentage: f64) -> &'static str {
    if percentage >= 80.0 {
        "pass"
    } else if percentage >= 50.0 {
        "warn"
    } else {
        "fail"
    }
}

fn generate_bar_chart(sections: &[SectionScore]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = sections.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, section) in sections.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let pct = section.percentage();
        let width = (pct / 100.0 * max_width as f64) as usize;

        let color = match band_class(pct) {
            "pass" => "#22c55e",
            "warn" => "#eab308",
            _ => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&section.section_id)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            pct
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.total .scaled { font-size: 3rem; font-weight: bold; }
.total .range { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
.skip { color: #6b7280; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(id, col) {
  const table = document.getElementById(id);
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
