//! Store traits — the boundary to the persistent store and the
//! change-tracking subsystem.
//!
//! The pipeline is single-threaded and synchronous; all I/O behind these
//! traits is blocking from its perspective. Implementations: the
//! in-memory backend in `taskbrief-store` (testing / ephemeral), real
//! database-backed stores out of scope.

use crate::entity::{Project, ScopeLevel, Task, WorkGroup};
use crate::error::StoreError;
use crate::policy::PolicyRule;
use crate::record::ContextRecord;
use crate::role::RoleAssignment;
use crate::session::SessionSummary;
use chrono::{DateTime, Utc};

/// The persistent-store contract the pipeline consumes.
pub trait ContextStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    // ── Entities ──

    fn fetch_project(&self, id: &str) -> Result<Option<Project>, StoreError>;

    fn fetch_work_group(&self, id: &str) -> Result<Option<WorkGroup>, StoreError>;

    fn fetch_task(&self, id: &str) -> Result<Option<Task>, StoreError>;

    // ── Context records ──

    /// Fetch the six-dimension record attached to one scope entity.
    fn fetch_context_record(
        &self,
        level: ScopeLevel,
        scope_id: &str,
    ) -> Result<Option<ContextRecord>, StoreError>;

    /// Fetch a record by its own id (used by the refresh path).
    fn fetch_context_record_by_id(&self, id: &str) -> Result<Option<ContextRecord>, StoreError>;

    /// All task-level records under a project (staleness scanning).
    fn list_task_context_records(
        &self,
        project_id: &str,
    ) -> Result<Vec<ContextRecord>, StoreError>;

    /// Write the terminal assembly bookkeeping: timestamp and confidence
    /// total. The only mutation this core ever performs.
    fn record_assembly(
        &self,
        record_id: &str,
        at: DateTime<Utc>,
        confidence: f64,
    ) -> Result<(), StoreError>;

    // ── Auxiliary material ──

    /// Enabled policy rules for a project.
    fn list_enabled_rules(&self, project_id: &str) -> Result<Vec<PolicyRule>, StoreError>;

    /// Recent session summaries for a work-group, newest first, bounded
    /// by `limit`.
    fn list_recent_summaries(
        &self,
        work_group_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError>;

    /// Resolve a role's capabilities, active flag, and custom SOP path.
    fn resolve_role(
        &self,
        project_id: &str,
        role: &str,
    ) -> Result<Option<RoleAssignment>, StoreError>;
}

/// The change-tracking subsystem boundary.
pub trait ChangeLog: Send + Sync {
    /// Count of changes recorded for a project after `since`.
    fn count_changes_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}
