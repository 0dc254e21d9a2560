//! Raw-to-scaled score conversion.
//!
//! A section either carries an explicit conversion table or falls back to a
//! linear mapping onto the SAT section range of 200-800.

use serde::{Deserialize, Serialize};

/// Lowest scaled score a section can report.
pub const SECTION_MIN_SCALED: u32 = 200;
/// Highest scaled score a section can report.
pub const SECTION_MAX_SCALED: u32 = 800;

/// One row of a conversion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalePoint {
    /// Raw points earned.
    pub raw: u32,
    /// Scaled score awarded from this raw score upward.
    pub scaled: u32,
}

/// A step-function conversion table.
///
/// The scaled score for `earned` raw points is taken from the row with the
/// greatest `raw <= earned`. Rows are expected in strictly increasing raw
/// order; validation rejects tables that are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleTable {
    pub points: Vec<ScalePoint>,
}

impl ScaleTable {
    /// Look up the scaled score for a raw score.
    ///
    /// Raw scores below the first row map to [`SECTION_MIN_SCALED`].
    pub fn lookup(&self, earned: u32) -> u32 {
        self.points
            .iter()
            .take_while(|p| p.raw <= earned)
            .last()
            .map(|p| p.scaled)
            .unwrap_or(SECTION_MIN_SCALED)
    }

    /// Describe the first structural problem with this table, if any.
    pub fn check(&self, max_raw: u32) -> Option<String> {
        if self.points.is_empty() {
            return Some("scale table is empty".into());
        }
        for pair in self.points.windows(2) {
            if pair[1].raw <= pair[0].raw {
                return Some(format!(
                    "raw points must strictly increase (row {} after {})",
                    pair[1].raw, pair[0].raw
                ));
            }
            if pair[1].scaled < pair[0].scaled {
                return Some(format!(
                    "scaled score decreases from {} to {} at raw {}",
                    pair[0].scaled, pair[1].scaled, pair[1].raw
                ));
            }
        }
        if let Some(p) = self.points.iter().find(|p| p.raw > max_raw) {
            return Some(format!(
                "raw points {} exceed section maximum of {max_raw}",
                p.raw
            ));
        }
        if let Some(p) = self
            .points
            .iter()
            .find(|p| !(SECTION_MIN_SCALED..=SECTION_MAX_SCALED).contains(&p.scaled))
        {
            return Some(format!(
                "scaled score {} outside {SECTION_MIN_SCALED}-{SECTION_MAX_SCALED}",
                p.scaled
            ));
        }
        None
    }
}

/// Scale a section score, using the table when present.
pub fn scale_section(earned: u32, possible: u32, table: Option<&ScaleTable>) -> u32 {
    match table {
        Some(table) => table.lookup(earned),
        None => linear_scale(earned, possible),
    }
}

/// Linear mapping onto 200-800, rounded to the nearest 10.
pub fn linear_scale(earned: u32, possible: u32) -> u32 {
    if possible == 0 {
        return SECTION_MIN_SCALED;
    }
    let fraction = f64::from(earned.min(possible)) / f64::from(possible);
    let span = f64::from(SECTION_MAX_SCALED - SECTION_MIN_SCALED);
    let raw = f64::from(SECTION_MIN_SCALED) + span * fraction;
    ((raw / 10.0).round() as u32) * 10
}

/// How section scaled scores combine into the overall score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallRule {
    /// Sum of section scores (SAT total, 400-1600 for two sections).
    #[default]
    Sum,
    /// Mean of section scores, rounded to the nearest 10.
    Mean,
}

impl OverallRule {
    /// Combine section scaled scores.
    pub fn combine(&self, scaled: &[u32]) -> u32 {
        match self {
            OverallRule::Sum => scaled.iter().sum(),
            OverallRule::Mean => {
                if scaled.is_empty() {
                    return 0;
                }
                let mean = f64::from(scaled.iter().sum::<u32>()) / scaled.len() as f64;
                ((mean / 10.0).round() as u32) * 10
            }
        }
    }

    /// The (min, max) range of the overall score for `sections` sections.
    pub fn range(&self, sections: usize) -> (u32, u32) {
        match self {
            OverallRule::Sum => (
                SECTION_MIN_SCALED * sections as u32,
                SECTION_MAX_SCALED * sections as u32,
            ),
            OverallRule::Mean if sections == 0 => (0, 0),
            OverallRule::Mean => (SECTION_MIN_SCALED, SECTION_MAX_SCALED),
        }
    }
}
