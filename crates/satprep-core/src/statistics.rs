//! Cohort statistics across many scored attempts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scoring::TestResult;

/// Aggregate statistics over a set of results for the same test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    /// Number of results aggregated.
    pub attempts: usize,
    /// Mean overall scaled score.
    pub mean_scaled: f64,
    pub min_scaled: u32,
    pub max_scaled: u32,
    /// Mean scaled score per section id.
    pub per_section_mean_scaled: BTreeMap<String, f64>,
    /// Fraction of attempts answering each question correctly.
    pub per_question_correct_rate: BTreeMap<String, f64>,
    /// Mean topic percentage per topic tag.
    pub per_topic_mean_percentage: BTreeMap<String, f64>,
}

/// Compute cohort statistics from scored results.
pub fn compute_cohort_stats(results: &[TestResult]) -> CohortStats {
    if results.is_empty() {
        return CohortStats::default();
    }
    let n = results.len() as f64;

    let scaled: Vec<u32> = results.iter().map(|r| r.overall.scaled).collect();
    let mean_scaled = scaled.iter().map(|&s| f64::from(s)).sum::<f64>() / n;

    let mut section_totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut question_totals: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut topic_totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for result in results {
        for section in &result.sections {
            let entry = section_totals.entry(section.section_id.clone()).or_default();
            entry.0 += f64::from(section.scaled);
            entry.1 += 1;
        }
        for question in &result.questions {
            let entry = question_totals.entry(question.question_id.clone()).or_default();
            if question.correct {
                entry.0 += 1;
            }
            entry.1 += 1;
        }
        for (topic, perf) in &result.topics {
            let entry = topic_totals.entry(topic.clone()).or_default();
            entry.0 += perf.percentage;
            entry.1 += 1;
        }
    }

    CohortStats {
        attempts: results.len(),
        mean_scaled,
        min_scaled: scaled.iter().copied().min().unwrap_or(0),
        max_scaled: scaled.iter().copied().max().unwrap_or(0),
        per_section_mean_scaled: section_totals
            .into_iter()
            .map(|(k, (sum, count))| (k, sum / count as f64))
            .collect(),
        per_question_correct_rate: question_totals
            .into_iter()
            .map(|(k, (correct, count))| (k, correct as f64 / count as f64))
            .collect(),
        per_topic_mean_percentage: topic_totals
            .into_iter()
            .map(|(k, (sum, count))| (k, sum / count as f64))
            .collect(),
    }
}
