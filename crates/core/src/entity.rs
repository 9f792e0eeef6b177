//! Core entities — the three nested scopes context is recorded at.
//!
//! A `Project` contains `WorkGroup`s which contain `Task`s. Context
//! recorded at a broader scope applies to everything nested under it
//! unless a more specific scope overrides it.

use serde::{Deserialize, Serialize};

/// The scope a context record is attached to, ordered from broadest to
/// most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    Project,
    WorkGroup,
    Task,
}

impl ScopeLevel {
    /// Stable string form, used in cache keys and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::WorkGroup => "work_group",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project — the broadest scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A work-group within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkGroup {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A task — the unit of autonomous work a payload is assembled for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub work_group_id: String,
    pub project_id: String,
    pub title: String,

    /// Task type, used to narrow the applicable policy rule set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,

    /// Default role assumed when the caller passes no override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
