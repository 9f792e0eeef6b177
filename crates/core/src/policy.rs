//! Policy rules — read-only governance records applied to a payload.
//!
//! Rules come from the store already scoped to a project. This core never
//! creates or edits them; it decides applicability per task type, narrows
//! the set by role capability, and renders a compressed summary.

use serde::{Deserialize, Serialize};

/// How strictly a rule is enforced downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnforcementLevel {
    /// Hard stop: violating work must not proceed.
    Block,
    /// Constrains how work is done.
    Limit,
    /// Advisory guidance.
    Guide,
    /// Optional enhancement suggestion.
    Enhance,
}

impl EnforcementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::Limit => "LIMIT",
            Self::Guide => "GUIDE",
            Self::Enhance => "ENHANCE",
        }
    }
}

impl std::fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy rule as the store returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub enforcement: EnforcementLevel,

    /// Optional category, mapped to role-capability domains by the filter.
    /// Rules without a category are always retained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Task types this rule is restricted to. Empty = applies universally.
    #[serde(default)]
    pub task_types: Vec<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl PolicyRule {
    /// Whether this rule applies to a task of the given type. A rule with
    /// no type restriction applies universally; otherwise the task's type
    /// must be in the declared set.
    pub fn applies_to(&self, task_type: Option<&str>) -> bool {
        if self.task_types.is_empty() {
            return true;
        }
        task_type.is_some_and(|t| self.task_types.iter().any(|r| r == t))
    }
}
