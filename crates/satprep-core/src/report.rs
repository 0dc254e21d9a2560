//! Score reports with JSON persistence and progress comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Test, TestAttempt};
use crate::scoring::TestResult;

/// A persisted score report: a pure [`TestResult`] plus identity metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The student the attempt belongs to.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Summary of the scored test.
    pub test: TestSummary,
    /// The scoring output.
    pub result: TestResult,
}

/// Summary of a test (without the full question definitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: String,
    pub title: String,
    pub section_count: usize,
    pub question_count: usize,
}

impl From<&Test> for TestSummary {
    fn from(test: &Test) -> Self {
        Self {
            id: test.id.clone(),
            title: test.title.clone(),
            section_count: test.sections.len(),
            question_count: test.question_count(),
        }
    }
}

impl ScoreReport {
    /// Wrap a freshly computed result.
    pub fn new(test: &Test, attempt: &TestAttempt, result: TestResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_id: attempt.user_id.clone(),
            test: TestSummary::from(test),
            result,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScoreReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against an earlier one.
    ///
    /// Percentages are compared on a 0-100 scale; a change larger than
    /// `threshold` percentage points counts as a regression or improvement.
    pub fn compare(&self, baseline: &ScoreReport, threshold: f64) -> ProgressReport {
        let current = percentage_map(&self.result);
        let previous = percentage_map(&baseline.result);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_areas = 0usize;

        for (area, &current_pct) in &current {
            let Some(&baseline_pct) = previous.get(area) else {
                new_areas += 1;
                continue;
            };
            let delta = current_pct - baseline_pct;
            let change = AreaChange {
                area: area.clone(),
                baseline_percentage: baseline_pct,
                current_percentage: current_pct,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_areas = previous.keys().filter(|k| !current.contains_key(*k)).count();

        ProgressReport {
            baseline_scaled: baseline.result.overall.scaled,
            current_scaled: self.result.overall.scaled,
            regressions,
            improvements,
            unchanged,
            new_areas,
            removed_areas,
        }
    }
}

/// Percentage correct keyed by area label (`overall`, `section:<id>`,
/// `topic:<tag>`, `skill:<tag>`).
fn percentage_map(result: &TestResult) -> BTreeMap<String, f64> {
    let mut map = BTreeMap::new();
    let overall = &result.overall;
    if overall.possible > 0 {
        map.insert(
            "overall".to_string(),
            f64::from(overall.earned) / f64::from(overall.possible) * 100.0,
        );
    }
    for section in &result.sections {
        map.insert(format!("section:{}", section.section_id), section.percentage());
    }
    for (topic, perf) in &result.topics {
        map.insert(format!("topic:{topic}"), perf.percentage);
    }
    for (skill, perf) in &result.skills {
        map.insert(format!("skill:{skill}"), perf.percentage);
    }
    map
}

/// Result of comparing two score reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_scaled: u32,
    pub current_scaled: u32,
    /// Areas where the percentage went down.
    pub regressions: Vec<AreaChange>,
    /// Areas where the percentage went up.
    pub improvements: Vec<AreaChange>,
    /// Areas with no significant change.
    pub unchanged: usize,
    /// Areas in current but not baseline.
    pub new_areas: usize,
    /// Areas in baseline but not current.
    pub removed_areas: usize,
}

/// A change in one scored area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaChange {
    pub area: String,
    pub baseline_percentage: f64,
    pub current_percentage: f64,
    pub delta: f64,
}

impl ProgressReport {
    /// Scaled score difference, current minus baseline.
    pub fn scaled_delta(&self) -> i64 {
        i64::from(self.current_scaled) - i64::from(self.baseline_scaled)
    }

    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Scaled score:** {} -> {} ({:+})\n\n",
            self.baseline_scaled,
            self.current_scaled,
            self.scaled_delta()
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Area | Baseline | Current | Delta |\n");
            md.push_str("|------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.area, c.baseline_percentage, c.current_percentage, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
