//! Optional process-local payload cache.
//!
//! Keyed `"{scope}:{id}"`, disabled by default, and owned by the
//! orchestrator instance that constructed it — there is no process-wide
//! singleton. Note the key carries no role information: a payload cached
//! under one role override is returned for any later override. The cache
//! ships disabled and refresh invalidates the owning entry, so this is
//! an accepted, documented trade for the simple key shape.

use crate::payload::ContextPayload;
use std::collections::HashMap;
use std::sync::RwLock;
use taskbrief_core::entity::ScopeLevel;

/// A process-local payload cache with scoped invalidation.
pub struct PayloadCache {
    enabled: bool,
    entries: RwLock<HashMap<String, ContextPayload>>,
}

impl PayloadCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn key(level: ScopeLevel, id: &str) -> String {
        format!("{}:{}", level.as_str(), id)
    }

    /// Fetch a cached payload, flagged as a cache hit.
    pub fn get(&self, level: ScopeLevel, id: &str) -> Option<ContextPayload> {
        if !self.enabled {
            return None;
        }
        let entries = self.entries.read().unwrap();
        entries.get(&Self::key(level, id)).map(|payload| {
            let mut hit = payload.clone();
            hit.metadata.cache_hit = true;
            hit
        })
    }

    /// Store a payload. No-op when disabled.
    pub fn put(&self, level: ScopeLevel, id: &str, payload: &ContextPayload) {
        if !self.enabled {
            return;
        }
        self.entries
            .write()
            .unwrap()
            .insert(Self::key(level, id), payload.clone());
    }

    /// Remove one entry. No-op when disabled or absent.
    pub fn invalidate(&self, level: ScopeLevel, id: &str) {
        if !self.enabled {
            return;
        }
        self.entries.write().unwrap().remove(&Self::key(level, id));
    }

    /// Remove every entry for a scope level.
    pub fn invalidate_scope(&self, level: ScopeLevel) {
        if !self.enabled {
            return;
        }
        let prefix = format!("{}:", level.as_str());
        self.entries
            .write()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
    }

    /// Clear the cache entirely. Idempotent.
    pub fn invalidate_all(&self) {
        if !self.enabled {
            return;
        }
        self.entries.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::AssemblyMetadata;
    use crate::scoring::ConfidenceScore;
    use chrono::Utc;

    fn payload() -> ContextPayload {
        ContextPayload {
            project: serde_json::Value::Null,
            work_group: serde_json::Value::Null,
            task: serde_json::Value::Null,
            merged: Default::default(),
            facts: Default::default(),
            amalgamations: Default::default(),
            sop: None,
            role: None,
            recent_sessions: vec![],
            rules: vec![],
            blocking_rules: vec![],
            rules_summary: String::new(),
            confidence: ConfidenceScore::default(),
            filter_reduction: 0.0,
            warnings: vec![],
            metadata: AssemblyMetadata {
                assembled_at: Utc::now(),
                duration_ms: 3,
                cache_hit: false,
            },
        }
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = PayloadCache::disabled();
        cache.put(ScopeLevel::Task, "t1", &payload());
        assert!(cache.get(ScopeLevel::Task, "t1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn hits_are_flagged() {
        let cache = PayloadCache::new(true);
        cache.put(ScopeLevel::Task, "t1", &payload());

        let hit = cache.get(ScopeLevel::Task, "t1").unwrap();
        assert!(hit.metadata.cache_hit);
        // The stored copy stays unflagged.
        assert!(!cache.entries.read().unwrap()["task:t1"].metadata.cache_hit);
    }

    #[test]
    fn scoped_invalidation() {
        let cache = PayloadCache::new(true);
        cache.put(ScopeLevel::Task, "t1", &payload());
        cache.put(ScopeLevel::Task, "t2", &payload());
        cache.put(ScopeLevel::Project, "p1", &payload());

        cache.invalidate(ScopeLevel::Task, "t1");
        assert!(cache.get(ScopeLevel::Task, "t1").is_none());
        assert!(cache.get(ScopeLevel::Task, "t2").is_some());

        cache.invalidate_scope(ScopeLevel::Task);
        assert!(cache.get(ScopeLevel::Task, "t2").is_none());
        assert!(cache.get(ScopeLevel::Project, "p1").is_some());
    }

    #[test]
    fn invalidate_all_is_idempotent() {
        let cache = PayloadCache::new(true);
        cache.put(ScopeLevel::Task, "t1", &payload());

        cache.invalidate_all();
        assert!(cache.is_empty());
        // A second clear of an already-empty cache is the same state.
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation_is_noop_when_disabled() {
        let cache = PayloadCache::disabled();
        cache.invalidate(ScopeLevel::Task, "t1");
        cache.invalidate_scope(ScopeLevel::Task);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
