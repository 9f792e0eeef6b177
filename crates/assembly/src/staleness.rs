//! Staleness detection and prioritized refresh.
//!
//! The detector inspects previously assembled task records' timestamps
//! and classifies each by age and by changes recorded since. The refresh
//! service re-runs assembly for stale records — one at a time, with
//! per-item isolation in batch mode so a single failure never stops the
//! rest.
//!
//! Refresh currently supports task-level records only; broader scopes
//! fail with [`Error::UnsupportedRefreshScope`] rather than being
//! silently ignored.

use crate::orchestrator::Orchestrator;
use crate::payload::ContextPayload;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use taskbrief_core::entity::ScopeLevel;
use taskbrief_core::error::{Error, Result};
use taskbrief_core::store::{ChangeLog, ContextStore};
use tracing::{debug, info, warn};

/// Refresh urgency of a stale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePriority {
    Low,
    Medium,
    High,
}

impl StalePriority {
    /// One step up; high stays high.
    pub fn escalate(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }
}

/// One stale context record — derived per detection run, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StalenessRecord {
    pub record_id: String,
    pub scope_level: ScopeLevel,
    pub scope_id: String,
    pub age_days: u64,
    pub priority: StalePriority,
    pub reasons: Vec<String>,
}

/// Detection tuning.
#[derive(Debug, Clone)]
pub struct StalenessOptions {
    /// Age in days below which a record is not stale.
    pub threshold_days: u32,
    /// Whether to consult the change log for escalation.
    pub check_change_log: bool,
}

impl Default for StalenessOptions {
    fn default() -> Self {
        Self {
            threshold_days: 7,
            check_change_log: true,
        }
    }
}

/// Batch refresh tuning.
#[derive(Debug, Clone)]
pub struct AutoRefreshOptions {
    /// Refresh only high-priority records.
    pub only_high_priority: bool,
    /// Consult the smart trigger evaluator before each refresh.
    pub use_smart_triggers: bool,
}

impl Default for AutoRefreshOptions {
    fn default() -> Self {
        Self {
            only_high_priority: true,
            use_smart_triggers: true,
        }
    }
}

/// External evaluator consulted by [`RefreshService::auto_refresh`] to
/// skip records that do not yet warrant the cost of a refresh.
pub trait RefreshTrigger: Send + Sync {
    fn should_refresh(&self, record: &StalenessRecord) -> bool;
}

/// One failed item in a batch refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshFailure {
    pub record_id: String,
    pub error: String,
}

/// Outcome of a batch refresh run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Stale records detected (before priority filtering).
    pub stale: usize,
    /// Record ids refreshed successfully.
    pub refreshed: Vec<String>,
    /// Per-item failures; the batch continued past each.
    pub failed: Vec<RefreshFailure>,
    pub duration_ms: u64,
}

/// Detects stale context and re-runs assembly for it.
pub struct RefreshService {
    orchestrator: Arc<Orchestrator>,
    change_log: Option<Arc<dyn ChangeLog>>,
    trigger: Option<Arc<dyn RefreshTrigger>>,
    staleness: StalenessOptions,
}

impl RefreshService {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            change_log: None,
            trigger: None,
            staleness: StalenessOptions::default(),
        }
    }

    pub fn with_change_log(mut self, change_log: Arc<dyn ChangeLog>) -> Self {
        self.change_log = Some(change_log);
        self
    }

    pub fn with_trigger(mut self, trigger: Arc<dyn RefreshTrigger>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_staleness(mut self, options: StalenessOptions) -> Self {
        self.staleness = options;
        self
    }

    /// Detect stale task records for a project, sorted by priority
    /// (high first) then by age (oldest first).
    pub fn detect_stale(
        &self,
        project_id: &str,
        options: &StalenessOptions,
    ) -> Result<Vec<StalenessRecord>> {
        let records = self
            .orchestrator
            .store()
            .list_task_context_records(project_id)?;
        let now = Utc::now();
        let threshold = i64::from(options.threshold_days);
        let mut stale = Vec::new();

        for record in records {
            // Records never assembled have no timestamp to age against.
            let Some(refreshed_at) = record.refreshed_at else {
                continue;
            };
            let age = (now - refreshed_at).num_days();
            if age < threshold {
                continue;
            }

            let mut priority = StalePriority::Low;
            if age >= 30 {
                priority = StalePriority::High;
            } else if age >= threshold {
                priority = StalePriority::Medium;
            }
            let mut reasons = vec![format!(
                "Context is {age} day(s) old (threshold {threshold})"
            )];

            if options.check_change_log {
                if let Some(change_log) = &self.change_log {
                    match change_log.count_changes_since(project_id, refreshed_at) {
                        Ok(count) if count > 0 => {
                            reasons.push(format!(
                                "{count} project change(s) recorded since last refresh"
                            ));
                            priority = priority.escalate();
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!(error = %e, "change log unavailable; age-only staleness");
                        }
                    }
                }
            }

            stale.push(StalenessRecord {
                record_id: record.id.clone(),
                scope_level: record.scope_level,
                scope_id: record.scope_id.clone(),
                age_days: age as u64,
                priority,
                reasons,
            });
        }

        stale.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.age_days.cmp(&a.age_days))
        });
        Ok(stale)
    }

    /// Refresh one context record: invalidate its cache entry, re-run
    /// assembly, persist the new timestamp and confidence total, return
    /// the new payload.
    pub fn refresh(&self, context_id: &str, reason: &str) -> Result<ContextPayload> {
        let record = self
            .orchestrator
            .store()
            .fetch_context_record_by_id(context_id)?
            .ok_or_else(|| Error::ContextRecordNotFound {
                id: context_id.to_string(),
            })?;

        if record.scope_level != ScopeLevel::Task {
            return Err(Error::UnsupportedRefreshScope {
                level: record.scope_level,
            });
        }

        info!(context_id, reason, "refreshing context");
        self.orchestrator
            .cache()
            .invalidate(ScopeLevel::Task, &record.scope_id);
        let payload = self.orchestrator.assemble(&record.scope_id, None)?;
        self.orchestrator.store().record_assembly(
            &record.id,
            payload.metadata.assembled_at,
            payload.confidence.total,
        )?;
        Ok(payload)
    }

    /// Detect and refresh in one pass. Per-item isolation: a failed
    /// refresh lands in the report and the batch continues.
    pub fn auto_refresh(
        &self,
        project_id: &str,
        options: &AutoRefreshOptions,
    ) -> Result<RefreshReport> {
        let started = Instant::now();
        let stale = self.detect_stale(project_id, &self.staleness)?;
        let mut report = RefreshReport {
            stale: stale.len(),
            refreshed: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0,
        };

        let candidates: Vec<StalenessRecord> = if options.only_high_priority {
            stale
                .into_iter()
                .filter(|s| s.priority == StalePriority::High)
                .collect()
        } else {
            stale
        };

        for record in candidates {
            if options.use_smart_triggers {
                if let Some(trigger) = &self.trigger {
                    if !trigger.should_refresh(&record) {
                        debug!(record_id = %record.record_id, "trigger declined refresh");
                        continue;
                    }
                }
            }

            match self.refresh(&record.record_id, "auto refresh") {
                Ok(_) => report.refreshed.push(record.record_id),
                Err(e) => {
                    warn!(record_id = %record.record_id, error = %e, "refresh failed");
                    report.failed.push(RefreshFailure {
                        record_id: record.record_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }
}
