//! An in-memory store that keeps everything in `RwLock`'d Vecs and maps.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::RwLock;
use taskbrief_core::entity::{Project, ScopeLevel, Task, WorkGroup};
use taskbrief_core::error::StoreError;
use taskbrief_core::policy::PolicyRule;
use taskbrief_core::record::ContextRecord;
use taskbrief_core::role::RoleAssignment;
use taskbrief_core::session::SessionSummary;
use taskbrief_core::store::{ChangeLog, ContextStore};
use uuid::Uuid;

/// Operations that can be made to fail, for exercising the pipeline's
/// degraded paths in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Entities,
    ContextRecords,
    Rules,
    Summaries,
    Roles,
    ChangeLog,
    RecordAssembly,
}

#[derive(Default)]
struct Inner {
    projects: Vec<Project>,
    work_groups: Vec<WorkGroup>,
    tasks: Vec<Task>,
    records: Vec<ContextRecord>,
    rules: Vec<PolicyRule>,
    /// (work_group_id, summary), insertion order preserved.
    summaries: Vec<(String, SessionSummary)>,
    /// (project_id, assignment).
    roles: Vec<(String, RoleAssignment)>,
    /// (project_id, changed_at) change-log entries.
    changes: Vec<(String, DateTime<Utc>)>,
}

/// An in-memory backend storing entities, records, rules, summaries, and
/// role assignments. Useful for tests and sessions where persistence
/// isn't needed.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    failing: RwLock<HashSet<FailPoint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    // ── Population helpers ──

    pub fn insert_project(&self, project: Project) {
        self.inner.write().unwrap().projects.push(project);
    }

    pub fn insert_work_group(&self, group: WorkGroup) {
        self.inner.write().unwrap().work_groups.push(group);
    }

    pub fn insert_task(&self, task: Task) {
        self.inner.write().unwrap().tasks.push(task);
    }

    /// Insert a context record, assigning an id when the caller left it
    /// empty. Returns the record id.
    pub fn insert_record(&self, mut record: ContextRecord) -> String {
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        let id = record.id.clone();
        self.inner.write().unwrap().records.push(record);
        id
    }

    pub fn insert_rule(&self, rule: PolicyRule) {
        self.inner.write().unwrap().rules.push(rule);
    }

    pub fn insert_summary(&self, work_group_id: &str, summary: SessionSummary) {
        self.inner
            .write()
            .unwrap()
            .summaries
            .push((work_group_id.to_string(), summary));
    }

    pub fn insert_role(&self, project_id: &str, assignment: RoleAssignment) {
        self.inner
            .write()
            .unwrap()
            .roles
            .push((project_id.to_string(), assignment));
    }

    pub fn insert_change(&self, project_id: &str, at: DateTime<Utc>) {
        self.inner
            .write()
            .unwrap()
            .changes
            .push((project_id.to_string(), at));
    }

    // ── Failure injection ──

    /// Make the given operation fail with `StoreError::Unavailable` until
    /// [`Self::heal`] is called.
    pub fn fail_on(&self, point: FailPoint) {
        self.failing.write().unwrap().insert(point);
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        self.failing.write().unwrap().clear();
    }

    fn check(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.failing.read().unwrap().contains(&point) {
            return Err(StoreError::Unavailable(format!(
                "injected failure at {point:?}"
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn fetch_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.check(FailPoint::Entities)?;
        let inner = self.inner.read().unwrap();
        Ok(inner.projects.iter().find(|p| p.id == id).cloned())
    }

    fn fetch_work_group(&self, id: &str) -> Result<Option<WorkGroup>, StoreError> {
        self.check(FailPoint::Entities)?;
        let inner = self.inner.read().unwrap();
        Ok(inner.work_groups.iter().find(|g| g.id == id).cloned())
    }

    fn fetch_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        self.check(FailPoint::Entities)?;
        let inner = self.inner.read().unwrap();
        Ok(inner.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn fetch_context_record(
        &self,
        level: ScopeLevel,
        scope_id: &str,
    ) -> Result<Option<ContextRecord>, StoreError> {
        self.check(FailPoint::ContextRecords)?;
        let inner = self.inner.read().unwrap();
        Ok(inner
            .records
            .iter()
            .find(|r| r.scope_level == level && r.scope_id == scope_id)
            .cloned())
    }

    fn fetch_context_record_by_id(&self, id: &str) -> Result<Option<ContextRecord>, StoreError> {
        self.check(FailPoint::ContextRecords)?;
        let inner = self.inner.read().unwrap();
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    fn list_task_context_records(
        &self,
        project_id: &str,
    ) -> Result<Vec<ContextRecord>, StoreError> {
        self.check(FailPoint::ContextRecords)?;
        let inner = self.inner.read().unwrap();
        let task_ids: HashSet<&str> = inner
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id.as_str())
            .collect();
        Ok(inner
            .records
            .iter()
            .filter(|r| {
                r.scope_level == ScopeLevel::Task && task_ids.contains(r.scope_id.as_str())
            })
            .cloned()
            .collect())
    }

    fn record_assembly(
        &self,
        record_id: &str,
        at: DateTime<Utc>,
        confidence: f64,
    ) -> Result<(), StoreError> {
        self.check(FailPoint::RecordAssembly)?;
        let mut inner = self.inner.write().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| StoreError::QueryFailed(format!("no record {record_id}")))?;
        record.refreshed_at = Some(at);
        record.confidence = Some(confidence);
        Ok(())
    }

    fn list_enabled_rules(&self, _project_id: &str) -> Result<Vec<PolicyRule>, StoreError> {
        self.check(FailPoint::Rules)?;
        let inner = self.inner.read().unwrap();
        Ok(inner.rules.iter().filter(|r| r.enabled).cloned().collect())
    }

    fn list_recent_summaries(
        &self,
        work_group_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, StoreError> {
        self.check(FailPoint::Summaries)?;
        let inner = self.inner.read().unwrap();
        let mut matching: Vec<SessionSummary> = inner
            .summaries
            .iter()
            .filter(|(g, _)| g == work_group_id)
            .map(|(_, s)| s.clone())
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(limit);
        Ok(matching)
    }

    fn resolve_role(
        &self,
        project_id: &str,
        role: &str,
    ) -> Result<Option<RoleAssignment>, StoreError> {
        self.check(FailPoint::Roles)?;
        let inner = self.inner.read().unwrap();
        Ok(inner
            .roles
            .iter()
            .find(|(p, a)| p == project_id && a.role == role)
            .map(|(_, a)| a.clone()))
    }
}

impl ChangeLog for InMemoryStore {
    fn count_changes_since(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.check(FailPoint::ChangeLog)?;
        let inner = self.inner.read().unwrap();
        Ok(inner
            .changes
            .iter()
            .filter(|(p, at)| p == project_id && *at > since)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use taskbrief_core::session::SummaryKind;

    fn store_with_task() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_project(Project {
            id: "p1".into(),
            name: "Atlas".into(),
            description: None,
        });
        store.insert_work_group(WorkGroup {
            id: "wg1".into(),
            project_id: "p1".into(),
            name: "Ingestion".into(),
            description: None,
        });
        store.insert_task(Task {
            id: "t1".into(),
            work_group_id: "wg1".into(),
            project_id: "p1".into(),
            title: "Ship the importer".into(),
            task_type: None,
            default_role: None,
            status: None,
        });
        store
    }

    #[test]
    fn fetch_entities_by_id() {
        let store = store_with_task();
        assert!(store.fetch_project("p1").unwrap().is_some());
        assert!(store.fetch_work_group("wg1").unwrap().is_some());
        assert!(store.fetch_task("t1").unwrap().is_some());
        assert!(store.fetch_task("missing").unwrap().is_none());
    }

    #[test]
    fn record_lookup_by_scope_and_id() {
        let store = store_with_task();
        let id = store.insert_record(ContextRecord::empty(ScopeLevel::Task, "t1"));

        let by_scope = store
            .fetch_context_record(ScopeLevel::Task, "t1")
            .unwrap()
            .unwrap();
        assert_eq!(by_scope.id, id);
        assert!(
            store
                .fetch_context_record_by_id(&id)
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .fetch_context_record(ScopeLevel::Project, "t1")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn list_task_records_scoped_to_project() {
        let store = store_with_task();
        store.insert_task(Task {
            id: "t_other".into(),
            work_group_id: "wg_x".into(),
            project_id: "p_other".into(),
            title: "Unrelated".into(),
            task_type: None,
            default_role: None,
            status: None,
        });
        store.insert_record(ContextRecord::empty(ScopeLevel::Task, "t1"));
        store.insert_record(ContextRecord::empty(ScopeLevel::Task, "t_other"));

        let records = store.list_task_context_records("p1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].scope_id, "t1");
    }

    #[test]
    fn record_assembly_writes_bookkeeping() {
        let store = store_with_task();
        let id = store.insert_record(ContextRecord::empty(ScopeLevel::Task, "t1"));
        let at = Utc::now();

        store.record_assembly(&id, at, 0.72).unwrap();
        let record = store.fetch_context_record_by_id(&id).unwrap().unwrap();
        assert_eq!(record.refreshed_at, Some(at));
        assert_eq!(record.confidence, Some(0.72));

        let err = store.record_assembly("missing", at, 0.5).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn summaries_newest_first_and_bounded() {
        let store = store_with_task();
        let base = Utc::now();
        for i in 0..4 {
            store.insert_summary(
                "wg1",
                SessionSummary {
                    text: format!("session {i}"),
                    kind: SummaryKind::Session,
                    timestamp: base - Duration::hours(i),
                    duration_minutes: None,
                    metadata: Default::default(),
                },
            );
        }

        let recent = store.list_recent_summaries("wg1", 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "session 0");
        assert_eq!(recent[1].text, "session 1");
    }

    #[test]
    fn change_counting_respects_cutoff() {
        let store = store_with_task();
        let now = Utc::now();
        store.insert_change("p1", now - Duration::days(3));
        store.insert_change("p1", now - Duration::hours(1));
        store.insert_change("p_other", now);

        let count = store
            .count_changes_since("p1", now - Duration::days(1))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn failure_injection_and_heal() {
        let store = store_with_task();
        store.fail_on(FailPoint::Summaries);
        assert!(store.list_recent_summaries("wg1", 5).is_err());
        // Other operations are unaffected.
        assert!(store.fetch_task("t1").is_ok());

        store.heal();
        assert!(store.list_recent_summaries("wg1", 5).is_ok());
    }
}
