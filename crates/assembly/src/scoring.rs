//! Weighted confidence scoring for an assembled context.
//!
//! Four factors, each normalized to [0,1] and weighted:
//!
//! | Factor | Weight | Signal |
//! |--------|--------|--------|
//! | Completeness | 0.35 | populated record fields / 15 |
//! | Facts quality | 0.25 | group count + attribute richness |
//! | File coverage | 0.25 | distinct amalgamation groups / 4 |
//! | Freshness | 0.15 | age-banded factor |
//!
//! The total is banded RED/YELLOW/GREEN and accompanied by
//! human-readable warnings for each weak factor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use taskbrief_core::record::SixDimensions;

const WEIGHT_COMPLETENESS: f64 = 0.35;
const WEIGHT_FACTS: f64 = 0.25;
const WEIGHT_FILES: f64 = 0.25;
const WEIGHT_FRESHNESS: f64 = 0.15;

/// Traffic-light classification of a confidence total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Band {
    Red,
    Yellow,
    Green,
}

impl Band {
    /// Band boundaries are exact: `< 0.5` RED, `< 0.8` YELLOW, else GREEN.
    pub fn for_total(total: f64) -> Self {
        if total < 0.5 {
            Band::Red
        } else if total < 0.8 {
            Band::Yellow
        } else {
            Band::Green
        }
    }
}

/// The four named sub-scores, each already in [0,1].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubScores {
    pub completeness: f64,
    pub facts_quality: f64,
    pub file_coverage: f64,
    pub freshness_factor: f64,
}

/// A computed confidence score. Computed fresh every assembly call and
/// never persisted as a standalone entity — refresh stores only the
/// total float next to the record it scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub total: f64,
    pub band: Band,
    pub subscores: SubScores,
    pub warnings: Vec<String>,
}

impl Default for ConfidenceScore {
    fn default() -> Self {
        Self {
            total: 0.0,
            band: Band::Red,
            subscores: SubScores::default(),
            warnings: Vec::new(),
        }
    }
}

/// Score a merged record together with its auxiliary signals.
pub fn score(
    merged: &SixDimensions,
    facts: &HashMap<String, serde_json::Value>,
    amalgamations: &HashMap<String, Vec<PathBuf>>,
    freshness_days: u64,
) -> ConfidenceScore {
    let mut warnings = Vec::new();

    let completeness = merged.populated_count() as f64 / 15.0;
    if completeness < 0.5 {
        warnings.push(format!(
            "Context record is sparse: {} of 15 fields populated",
            merged.populated_count()
        ));
    }

    let facts_quality = facts_quality(facts);
    if facts.is_empty() {
        warnings.push("No external facts available".to_string());
    }

    let file_coverage = (amalgamations.len() as f64 / 4.0).min(1.0);
    if file_coverage < 0.5 {
        warnings.push(format!(
            "Low file coverage: {} amalgamation group(s) found",
            amalgamations.len()
        ));
    }

    let freshness_factor = freshness_factor(freshness_days);
    if freshness_factor < 0.8 {
        warnings.push(format!(
            "Context is {freshness_days} day(s) old; consider a refresh"
        ));
    }

    let total = (WEIGHT_COMPLETENESS * completeness
        + WEIGHT_FACTS * facts_quality
        + WEIGHT_FILES * file_coverage
        + WEIGHT_FRESHNESS * freshness_factor)
        .clamp(0.0, 1.0);

    ConfidenceScore {
        total,
        band: Band::for_total(total),
        subscores: SubScores {
            completeness,
            facts_quality,
            file_coverage,
            freshness_factor,
        },
        warnings,
    }
}

/// Facts quality: half for breadth (groups, saturating at 5), half for
/// richness (share of groups carrying more than two attributes). A fact
/// group's attribute count is its JSON object length; non-object values
/// count as one attribute.
fn facts_quality(facts: &HashMap<String, serde_json::Value>) -> f64 {
    if facts.is_empty() {
        return 0.0;
    }
    let breadth = (facts.len() as f64 / 5.0).min(1.0);
    let rich = facts
        .values()
        .filter(|v| attribute_count(v) > 2)
        .count() as f64;
    let richness = rich / facts.len() as f64;
    0.5 * breadth + 0.5 * richness
}

fn attribute_count(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Object(map) => map.len(),
        _ => 1,
    }
}

/// Age-banded freshness: a week-old record is full strength, a
/// quarter-old one nearly worthless.
fn freshness_factor(days: u64) -> f64 {
    match days {
        0..=7 => 1.0,
        8..=30 => 0.8,
        31..=90 => 0.5,
        _ => 0.2,
    }
}
