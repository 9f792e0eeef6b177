//! The assembled context payload — the pipeline's externally visible
//! result.
//!
//! Every field has a safe default (empty collection or `None`); a
//! serialized payload never omits a documented key. Constructed once per
//! assembly call, immutable after construction, discarded by the caller.

use crate::scoring::ConfidenceScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use taskbrief_core::policy::PolicyRule;
use taskbrief_core::record::SixDimensions;
use taskbrief_core::session::SessionSummary;

/// Assembly bookkeeping attached to each payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// When assembly finished.
    pub assembled_at: DateTime<Utc>,
    /// Wall-clock duration of the assembly call.
    pub duration_ms: u64,
    /// Whether this payload came from the process-local cache.
    pub cache_hit: bool,
}

/// The complete context bundle handed to downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPayload {
    /// Serialized entity snapshots.
    #[serde(default)]
    pub project: serde_json::Value,
    #[serde(default)]
    pub work_group: serde_json::Value,
    #[serde(default)]
    pub task: serde_json::Value,

    /// The merged six-dimension record.
    #[serde(default)]
    pub merged: SixDimensions,

    /// External facts, possibly narrowed by the role filter.
    #[serde(default)]
    pub facts: HashMap<String, serde_json::Value>,

    /// Amalgamation file-path groupings, possibly narrowed by the filter.
    #[serde(default)]
    pub amalgamations: HashMap<String, Vec<PathBuf>>,

    /// Role SOP text, when a role resolved and its file exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sop: Option<String>,

    /// The resolved role name, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Recent session summaries, newest first.
    #[serde(default)]
    pub recent_sessions: Vec<SessionSummary>,

    /// Applicable policy rules.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    /// The BLOCK-enforced subset of `rules`.
    #[serde(default)]
    pub blocking_rules: Vec<PolicyRule>,
    /// Compressed, level-grouped rule summary.
    #[serde(default)]
    pub rules_summary: String,

    /// The confidence score and its breakdown.
    pub confidence: ConfidenceScore,

    /// How much role filtering reduced facts + amalgamations, in [0,1].
    #[serde(default)]
    pub filter_reduction: f64,

    /// Everything that degraded along the way.
    #[serde(default)]
    pub warnings: Vec<String>,

    pub metadata: AssemblyMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_payload_keeps_all_container_keys() {
        let payload = ContextPayload {
            project: serde_json::Value::Null,
            work_group: serde_json::Value::Null,
            task: serde_json::Value::Null,
            merged: SixDimensions::default(),
            facts: HashMap::new(),
            amalgamations: HashMap::new(),
            sop: None,
            role: None,
            recent_sessions: Vec::new(),
            rules: Vec::new(),
            blocking_rules: Vec::new(),
            rules_summary: String::new(),
            confidence: ConfidenceScore::default(),
            filter_reduction: 0.0,
            warnings: Vec::new(),
            metadata: AssemblyMetadata {
                assembled_at: Utc::now(),
                duration_ms: 0,
                cache_hit: false,
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        for key in [
            "project",
            "work_group",
            "task",
            "merged",
            "facts",
            "amalgamations",
            "recent_sessions",
            "rules",
            "blocking_rules",
            "rules_summary",
            "confidence",
            "filter_reduction",
            "warnings",
            "metadata",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
