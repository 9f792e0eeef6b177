//! The assembly pipeline — the core architectural component.
//!
//! Builds a complete briefing payload for a task in twelve strictly
//! ordered steps:
//!
//! 1. **Load entities** (task, work-group, project) — fatal on absence
//! 2. **Load scope records** — missing levels degrade to empty + warning
//! 3. **Merge** — most-specific-wins across the three levels
//! 4. **External facts** — project record's cache, else empty
//! 5. **Amalgamations** — directory scan, empty on absence
//! 6. **Freshness** — age of the task record, 999 = never assembled
//! 7. **Score** — weighted confidence + warnings
//! 8. **Role + SOP** — override beats task default; inactive role fatal
//! 9. **Temporal context** — soft-fail to empty
//! 10. **Role filter** — narrow facts/amalgamations, record reduction
//! 11. **Policy rules** — applicability, blocking subset, summary
//! 12. **Payload** — construct, time, cache
//!
//! Failure criticality is tiered: only steps 1 and 8 can abort; every
//! other step degrades into a warning carried in the payload.

use crate::amalgams;
use crate::cache::PayloadCache;
use crate::merge::ContextMerger;
use crate::payload::{AssemblyMetadata, ContextPayload};
use crate::role_filter::{self, RoleFilter};
use crate::rules;
use crate::scoring;
use crate::sop::SopLoader;
use crate::temporal::TemporalLoader;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use taskbrief_config::AssemblyConfig;
use taskbrief_core::entity::ScopeLevel;
use taskbrief_core::error::{EntityKind, Error, Result};
use taskbrief_core::record::ContextRecord;
use taskbrief_core::store::ContextStore;
use tracing::{debug, info, warn};

/// Freshness sentinel for a task that never had a payload assembled.
const NEVER_ASSEMBLED_DAYS: u64 = 999;

/// Reduction fraction above which filtering gets an informational warning.
const REDUCTION_WARN_THRESHOLD: f64 = 0.3;

/// A step outcome that degraded instead of failing: the usable value plus
/// the warnings the step produced. Soft failure is a value, not a caught
/// exception.
struct Degraded<T> {
    value: T,
    warnings: Vec<String>,
}

impl<T> Degraded<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    fn warn(value: T, warning: String) -> Self {
        Self {
            value,
            warnings: vec![warning],
        }
    }
}

/// The assembly orchestrator. Owns its cache and loaders; create one per
/// configuration and reuse it.
pub struct Orchestrator {
    store: Arc<dyn ContextStore>,
    config: AssemblyConfig,
    cache: PayloadCache,
    sop: SopLoader,
    temporal: TemporalLoader,
    filter: RoleFilter,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ContextStore>, config: AssemblyConfig) -> Self {
        let cache = PayloadCache::new(config.cache_enabled);
        let sop = SopLoader::new(config.sop_dir.clone());
        let temporal = TemporalLoader::new(config.temporal_limit);
        Self {
            store,
            config,
            cache,
            sop,
            temporal,
            filter: RoleFilter::with_default_mapping(),
        }
    }

    /// Replace the default capability→domain mapping.
    pub fn with_filter(mut self, filter: RoleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    /// Assemble the briefing payload for a task.
    ///
    /// Fails only when a core entity is missing or the resolved role is
    /// marked inactive; everything else degrades into payload warnings.
    pub fn assemble(
        &self,
        task_id: &str,
        role_override: Option<&str>,
    ) -> Result<ContextPayload> {
        if let Some(hit) = self.cache.get(ScopeLevel::Task, task_id) {
            debug!(task_id, "payload cache hit");
            return Ok(hit);
        }

        let started = Instant::now();
        let mut warnings: Vec<String> = Vec::new();
        debug!(task_id, ?role_override, "assembling context");

        // ── Step 1: core entities (critical) ───────────────────────────
        let task = self
            .store
            .fetch_task(task_id)?
            .ok_or_else(|| Error::EntityNotFound {
                kind: EntityKind::Task,
                id: task_id.to_string(),
            })?;
        let work_group = self
            .store
            .fetch_work_group(&task.work_group_id)?
            .ok_or_else(|| Error::EntityNotFound {
                kind: EntityKind::WorkGroup,
                id: task.work_group_id.clone(),
            })?;
        let project = self
            .store
            .fetch_project(&task.project_id)?
            .ok_or_else(|| Error::EntityNotFound {
                kind: EntityKind::Project,
                id: task.project_id.clone(),
            })?;

        // ── Step 2: scope records (degraded) ───────────────────────────
        let task_record = self.load_record(ScopeLevel::Task, &task.id);
        let group_record = self.load_record(ScopeLevel::WorkGroup, &work_group.id);
        let project_record = self.load_record(ScopeLevel::Project, &project.id);
        for step in [&task_record, &group_record, &project_record] {
            warnings.extend(step.warnings.iter().cloned());
        }

        // ── Step 3: merge ──────────────────────────────────────────────
        let merger = ContextMerger::new(
            task_record.value.as_ref(),
            group_record.value.as_ref(),
            project_record.value.as_ref(),
        );
        let merged = merger.merge();

        // ── Step 4: external facts ─────────────────────────────────────
        let mut facts: HashMap<String, serde_json::Value> = project_record
            .value
            .as_ref()
            .and_then(|r| r.facts_cache.clone())
            .unwrap_or_default();

        // ── Step 5: amalgamation groupings ─────────────────────────────
        let mut amalgamations = amalgams::scan(&self.config.amalgam_dir);

        // ── Step 6: freshness ──────────────────────────────────────────
        let freshness_days = task_record
            .value
            .as_ref()
            .and_then(|r| r.refreshed_at)
            .map(|ts| (Utc::now() - ts).num_days().max(0) as u64)
            .unwrap_or(NEVER_ASSEMBLED_DAYS);

        // ── Step 7: score ──────────────────────────────────────────────
        let confidence = scoring::score(&merged, &facts, &amalgamations, freshness_days);
        warnings.extend(confidence.warnings.iter().cloned());

        // ── Step 8: role + SOP (inactive role is fatal) ────────────────
        let role = role_override
            .map(str::to_string)
            .or_else(|| task.default_role.clone());
        let sop = match &role {
            Some(role_name) => {
                match self.sop.load(&project.id, role_name, self.store.as_ref())? {
                    Some(text) => Some(text),
                    None => {
                        warnings.push(format!("No SOP found for role '{role_name}'"));
                        None
                    }
                }
            }
            None => None,
        };

        // ── Step 9: temporal context ───────────────────────────────────
        let (recent_sessions, temporal_warning) =
            self.temporal.load_recent(&work_group.id, self.store.as_ref());
        warnings.extend(temporal_warning);

        // ── Step 10: role filtering ────────────────────────────────────
        let mut capabilities: Vec<String> = Vec::new();
        let mut filter_reduction = 0.0;
        if let Some(role_name) = &role {
            capabilities = match self.store.resolve_role(&project.id, role_name) {
                Ok(Some(assignment)) => assignment.capabilities,
                Ok(None) => Vec::new(),
                Err(e) => {
                    warnings.push(format!(
                        "Role filtering failed; keeping unfiltered material: {e}"
                    ));
                    Vec::new()
                }
            };

            if !capabilities.is_empty() {
                let before = facts.len() + amalgamations.len();
                let kept_facts = self.filter.filter_facts(&facts, &capabilities);
                let kept_files = self.filter.filter_files(&amalgamations, &capabilities);
                filter_reduction =
                    role_filter::effectiveness(before, kept_facts.len() + kept_files.len());
                if filter_reduction > REDUCTION_WARN_THRESHOLD {
                    warnings.push(format!(
                        "Role filtering reduced context material by {:.0}%",
                        filter_reduction * 100.0
                    ));
                }
                facts = kept_facts;
                amalgamations = kept_files;
            }
        }

        // ── Step 11: policy rules ──────────────────────────────────────
        let applicable = match self.store.list_enabled_rules(&project.id) {
            Ok(all) => rules::applicable(all, task.task_type.as_deref()),
            Err(e) => {
                warn!(error = %e, "policy rules unavailable");
                warnings.push(format!("Failed to load policy rules: {e}"));
                Vec::new()
            }
        };
        let applicable = if capabilities.is_empty() {
            applicable
        } else {
            self.filter.filter_rules(&applicable, &capabilities)
        };
        let blocking_rules = rules::blocking(&applicable);
        let rules_summary = rules::summarize(&applicable);

        // ── Step 12: payload ───────────────────────────────────────────
        let payload = ContextPayload {
            project: serde_json::to_value(&project).unwrap_or_default(),
            work_group: serde_json::to_value(&work_group).unwrap_or_default(),
            task: serde_json::to_value(&task).unwrap_or_default(),
            merged,
            facts,
            amalgamations,
            sop,
            role,
            recent_sessions,
            rules: applicable,
            blocking_rules,
            rules_summary,
            confidence,
            filter_reduction,
            warnings,
            metadata: AssemblyMetadata {
                assembled_at: Utc::now(),
                duration_ms: started.elapsed().as_millis() as u64,
                cache_hit: false,
            },
        };

        info!(
            task_id,
            total = payload.confidence.total,
            band = ?payload.confidence.band,
            warnings = payload.warnings.len(),
            "context assembled"
        );
        self.cache.put(ScopeLevel::Task, task_id, &payload);
        Ok(payload)
    }

    /// Step 2 helper: a missing or unreadable record degrades to `None`
    /// (merged as an empty record) plus a warning.
    fn load_record(&self, level: ScopeLevel, scope_id: &str) -> Degraded<Option<ContextRecord>> {
        match self.store.fetch_context_record(level, scope_id) {
            Ok(Some(record)) => Degraded::clean(Some(record)),
            Ok(None) => Degraded::warn(
                None,
                format!("No {level}-level context record for '{scope_id}'; using an empty record"),
            ),
            Err(e) => Degraded::warn(
                None,
                format!("Failed to load {level}-level context record for '{scope_id}': {e}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskbrief_core::entity::{Project, Task, WorkGroup};
    use taskbrief_core::policy::{EnforcementLevel, PolicyRule};
    use taskbrief_core::role::RoleAssignment;
    use taskbrief_store::{FailPoint, InMemoryStore};

    fn seeded_store() -> Arc<InMemoryStore> {
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
            task_type: Some("feature".into()),
            default_role: None,
            status: None,
        });
        Arc::new(store)
    }

    fn orchestrator(store: Arc<InMemoryStore>) -> Orchestrator {
        let mut config = AssemblyConfig::default();
        // Point filesystem lookups somewhere that never exists.
        config.sop_dir = std::env::temp_dir().join("taskbrief-none/sops");
        config.amalgam_dir = std::env::temp_dir().join("taskbrief-none/amalg");
        Orchestrator::new(store, config)
    }

    fn record_with(
        level: ScopeLevel,
        scope_id: &str,
        build: impl FnOnce(&mut ContextRecord),
    ) -> ContextRecord {
        let mut record = ContextRecord::empty(level, scope_id);
        build(&mut record);
        record
    }

    #[test]
    fn missing_task_is_fatal() {
        let store = seeded_store();
        let orch = orchestrator(store);
        let err = orch.assemble("missing", None).unwrap_err();
        assert!(matches!(err, Error::EntityNotFound { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn missing_work_group_is_fatal() {
        let store = seeded_store();
        store.insert_task(Task {
            id: "orphan".into(),
            work_group_id: "wg_gone".into(),
            project_id: "p1".into(),
            title: "Orphaned".into(),
            task_type: None,
            default_role: None,
            status: None,
        });
        let orch = orchestrator(store);
        let err = orch.assemble("orphan", None).unwrap_err();
        assert!(err.to_string().contains("Work group"));
    }

    #[test]
    fn missing_records_degrade_with_warnings() {
        let store = seeded_store();
        let orch = orchestrator(store);
        let payload = orch.assemble("t1", None).unwrap();

        assert_eq!(payload.merged.populated_count(), 0);
        let record_warnings = payload
            .warnings
            .iter()
            .filter(|w| w.contains("context record"))
            .count();
        assert_eq!(record_warnings, 3);
        // Never assembled → rock-bottom freshness.
        assert_eq!(payload.confidence.subscores.freshness_factor, 0.2);
        assert!(!payload.metadata.cache_hit);
    }

    #[test]
    fn merged_record_and_facts_flow_into_payload() {
        let store = seeded_store();
        store.insert_record(record_with(ScopeLevel::Project, "p1", |r| {
            r.dimensions.business_value = Some("grow revenue".into());
            r.facts_cache = Some(HashMap::from([(
                "architecture".to_string(),
                serde_json::json!({"style": "soa", "services": 4, "queues": 2}),
            )]));
        }));
        store.insert_record(record_with(ScopeLevel::Task, "t1", |r| {
            r.dimensions.functional_requirements = vec!["parse the feed".into()];
        }));

        let orch = orchestrator(store);
        let payload = orch.assemble("t1", None).unwrap();

        assert_eq!(payload.merged.business_value.as_deref(), Some("grow revenue"));
        assert_eq!(payload.merged.functional_requirements, ["parse the feed"]);
        assert!(payload.facts.contains_key("architecture"));
        assert!(payload.confidence.subscores.facts_quality > 0.0);
    }

    #[test]
    fn role_override_beats_task_default() {
        let store = seeded_store();
        store.insert_task(Task {
            id: "t2".into(),
            work_group_id: "wg1".into(),
            project_id: "p1".into(),
            title: "With default role".into(),
            task_type: None,
            default_role: Some("backend-dev".into()),
            status: None,
        });
        let orch = orchestrator(store);

        let payload = orch.assemble("t2", Some("reviewer")).unwrap();
        assert_eq!(payload.role.as_deref(), Some("reviewer"));

        let payload = orch.assemble("t2", None).unwrap();
        assert_eq!(payload.role.as_deref(), Some("backend-dev"));
        assert!(
            payload
                .warnings
                .iter()
                .any(|w| w.contains("No SOP found for role 'backend-dev'"))
        );
    }

    #[test]
    fn inactive_role_aborts_assembly() {
        let store = seeded_store();
        let mut assignment = RoleAssignment::new("reviewer");
        assignment.active = false;
        store.insert_role("p1", assignment);

        let orch = orchestrator(store);
        let err = orch.assemble("t1", Some("reviewer")).unwrap_err();
        assert!(matches!(err, Error::RoleInactive { .. }));
    }

    #[test]
    fn temporal_failure_degrades() {
        let store = seeded_store();
        store.fail_on(FailPoint::Summaries);
        let orch = orchestrator(store);

        let payload = orch.assemble("t1", None).unwrap();
        assert!(payload.recent_sessions.is_empty());
        assert!(
            payload
                .warnings
                .iter()
                .any(|w| w.contains("session history"))
        );
    }

    #[test]
    fn rule_failure_degrades_to_empty_set() {
        let store = seeded_store();
        store.fail_on(FailPoint::Rules);
        let orch = orchestrator(store);

        let payload = orch.assemble("t1", None).unwrap();
        assert!(payload.rules.is_empty());
        assert!(payload.rules_summary.is_empty());
        assert!(payload.warnings.iter().any(|w| w.contains("policy rules")));
    }

    #[test]
    fn rules_filtered_by_task_type_and_summarized() {
        let store = seeded_store();
        store.insert_rule(PolicyRule {
            id: "b1".into(),
            name: "Release gate".into(),
            description: "All changes pass the release gate".into(),
            enforcement: EnforcementLevel::Block,
            category: None,
            task_types: vec![],
            enabled: true,
        });
        store.insert_rule(PolicyRule {
            id: "x1".into(),
            name: "Hotfix only".into(),
            description: String::new(),
            enforcement: EnforcementLevel::Limit,
            category: None,
            task_types: vec!["hotfix".into()],
            enabled: true,
        });

        let orch = orchestrator(store);
        let payload = orch.assemble("t1", None).unwrap();

        assert_eq!(payload.rules.len(), 1);
        assert_eq!(payload.blocking_rules.len(), 1);
        assert!(payload.rules_summary.contains("[b1] Release gate"));
        assert!(!payload.rules_summary.contains("Hotfix"));
    }

    #[test]
    fn heavy_filtering_warns_and_records_reduction() {
        let store = seeded_store();
        let mut assignment = RoleAssignment::new("backend-dev");
        assignment.capabilities = vec!["backend".into()];
        store.insert_role("p1", assignment);
        store.insert_record(record_with(ScopeLevel::Project, "p1", |r| {
            r.facts_cache = Some(HashMap::from([
                ("api".to_string(), serde_json::json!({})),
                ("ui_theme".to_string(), serde_json::json!({})),
                ("frontend_routes".to_string(), serde_json::json!({})),
            ]));
        }));

        let orch = orchestrator(store);
        let payload = orch.assemble("t1", Some("backend-dev")).unwrap();

        assert!(payload.facts.contains_key("api"));
        assert!(!payload.facts.contains_key("ui_theme"));
        assert!(payload.filter_reduction > REDUCTION_WARN_THRESHOLD);
        assert!(
            payload
                .warnings
                .iter()
                .any(|w| w.contains("reduced context material"))
        );
    }

    #[test]
    fn empty_capabilities_leave_material_untouched() {
        let store = seeded_store();
        store.insert_role("p1", RoleAssignment::new("generalist"));
        store.insert_record(record_with(ScopeLevel::Project, "p1", |r| {
            r.facts_cache = Some(HashMap::from([
                ("ui_theme".to_string(), serde_json::json!({})),
            ]));
        }));

        let orch = orchestrator(store);
        let payload = orch.assemble("t1", Some("generalist")).unwrap();
        assert!(payload.facts.contains_key("ui_theme"));
        assert_eq!(payload.filter_reduction, 0.0);
    }

    #[test]
    fn enabled_cache_serves_second_call() {
        let store = seeded_store();
        let mut config = AssemblyConfig::default();
        config.cache_enabled = true;
        config.sop_dir = std::env::temp_dir().join("taskbrief-none/sops");
        config.amalgam_dir = std::env::temp_dir().join("taskbrief-none/amalg");
        let orch = Orchestrator::new(store, config);

        let first = orch.assemble("t1", None).unwrap();
        assert!(!first.metadata.cache_hit);

        let second = orch.assemble("t1", None).unwrap();
        assert!(second.metadata.cache_hit);
        assert_eq!(second.confidence.total, first.confidence.total);
    }

    #[test]
    fn amalgamations_scanned_from_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("amalgamated_api.md"), "api docs").unwrap();
        std::fs::write(dir.path().join("amalgamated_database.md"), "schemas").unwrap();

        let store = seeded_store();
        let mut config = AssemblyConfig::default();
        config.sop_dir = std::env::temp_dir().join("taskbrief-none/sops");
        config.amalgam_dir = dir.path().to_path_buf();
        let orch = Orchestrator::new(store, config);

        let payload = orch.assemble("t1", None).unwrap();
        assert_eq!(payload.amalgamations.len(), 2);
        assert!(payload.amalgamations.contains_key("api"));
    }
}
