//! Session summaries — continuity records from earlier working sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of summary recorded at the end of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    Session,
    Milestone,
    Checkpoint,
    Handoff,
}

/// One recorded session summary for a work-group.
///
/// `metadata` is free-form and may carry key decisions, completed-task
/// references, resolved-blocker references, or next-step notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub text: String,
    pub kind: SummaryKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
