//! Error types for the taskbrief domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Only *fatal*
//! conditions are modeled as errors: a missing core entity, an inactive
//! role assignment, or a refresh aimed at something that cannot be
//! refreshed. Everything the pipeline can survive is carried as a warning
//! string inside the assembled payload instead, so the fatal/degraded
//! distinction is enforced by the type system rather than by convention.

use crate::entity::ScopeLevel;
use thiserror::Error;

/// The top-level error type for all taskbrief operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A core entity (project, work-group, or task) could not be found.
    /// Assembly cannot proceed without all three.
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: String },

    /// The role exists in the registry but is marked inactive. Distinct
    /// from a missing SOP file, which only degrades to a warning.
    #[error("Role assignment '{role}' is inactive")]
    RoleInactive { role: String },

    /// A refresh was requested for a context record id that does not exist.
    #[error("Context record not found: {id}")]
    ContextRecordNotFound { id: String },

    /// Refresh currently supports task-level records only. Work-group and
    /// project records fail loudly rather than being silently skipped.
    #[error("Refresh is not supported for {level}-level context records")]
    UnsupportedRefreshScope { level: ScopeLevel },

    /// The store failed while fetching a core entity (step 1 is critical).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of core entity involved in a lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    WorkGroup,
    Task,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project => write!(f, "Project"),
            Self::WorkGroup => write!(f, "Work group"),
            Self::Task => write!(f, "Task"),
        }
    }
}

/// Errors surfaced by store implementations.
///
/// The orchestrator decides criticality per pipeline step: a store error
/// while loading the three core entities aborts assembly, the same error
/// while loading session summaries degrades to a warning.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_not_found_displays_kind_and_id() {
        let err = Error::EntityNotFound {
            kind: EntityKind::WorkGroup,
            id: "wg_42".into(),
        };
        assert_eq!(err.to_string(), "Work group not found: wg_42");
    }

    #[test]
    fn inactive_role_names_the_role() {
        let err = Error::RoleInactive {
            role: "backend-dev".into(),
        };
        assert!(err.to_string().contains("backend-dev"));
        assert!(err.to_string().contains("inactive"));
    }

    #[test]
    fn unsupported_refresh_scope_names_the_level() {
        let err = Error::UnsupportedRefreshScope {
            level: ScopeLevel::Project,
        };
        assert!(err.to_string().contains("project"));
    }

    #[test]
    fn store_error_converts() {
        let err: Error = StoreError::QueryFailed("timeout".into()).into();
        assert!(err.to_string().contains("timeout"));
    }
}
