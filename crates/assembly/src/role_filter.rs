//! Capability-based narrowing of auxiliary material.
//!
//! Three independent filters share one capability lookup: file-path
//! groupings, fact groups, and policy rules. The filter *applies* a
//! capability taxonomy supplied from outside — the capability→domain
//! mapping is injected, with a conventional default table shipped for
//! callers that have none. An empty capability list disables filtering
//! entirely: everything passes through unchanged.

use std::collections::HashMap;
use std::path::PathBuf;
use taskbrief_core::policy::PolicyRule;
use taskbrief_core::store::ContextStore;
use tracing::debug;

/// Group names always retained regardless of capabilities.
const UNIVERSAL_GROUPS: [&str; 7] = [
    "readme",
    "overview",
    "architecture",
    "docs",
    "glossary",
    "shared",
    "common",
];

/// Filters payload material down to what a role's capabilities cover.
pub struct RoleFilter {
    /// capability → domains it grants access to, lowercase.
    domain_map: HashMap<String, Vec<String>>,
}

impl RoleFilter {
    pub fn new(domain_map: HashMap<String, Vec<String>>) -> Self {
        Self { domain_map }
    }

    /// A conventional capability→domain table for common engineering
    /// roles. Callers with their own taxonomy inject it via [`Self::new`].
    pub fn with_default_mapping() -> Self {
        let table: [(&str, &[&str]); 7] = [
            ("backend", &["api", "services", "database", "schema", "storage"]),
            ("frontend", &["ui", "components", "views", "styles", "assets"]),
            ("devops", &["infrastructure", "deployment", "pipelines", "monitoring"]),
            ("qa", &["tests", "testing", "fixtures", "quality"]),
            ("security", &["auth", "authentication", "secrets", "compliance"]),
            ("data", &["analytics", "etl", "datasets", "models"]),
            ("docs", &["documentation", "guides", "runbooks"]),
        ];
        Self::new(
            table
                .into_iter()
                .map(|(cap, domains)| {
                    (
                        cap.to_string(),
                        domains.iter().map(|d| d.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }

    /// Resolve a role's capabilities. Empty on any resolution failure,
    /// which disables filtering for the call.
    pub fn capabilities(
        &self,
        project_id: &str,
        role: &str,
        store: &dyn ContextStore,
    ) -> Vec<String> {
        match store.resolve_role(project_id, role) {
            Ok(Some(assignment)) => assignment.capabilities,
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(role, error = %e, "capability resolution failed; filtering disabled");
                Vec::new()
            }
        }
    }

    /// Keep a file grouping iff its derived type matches a capability, or
    /// it belongs to the always-retained universal set.
    pub fn filter_files(
        &self,
        files: &HashMap<String, Vec<PathBuf>>,
        capabilities: &[String],
    ) -> HashMap<String, Vec<PathBuf>> {
        if capabilities.is_empty() {
            return files.clone();
        }
        files
            .iter()
            .filter(|(group, _)| {
                is_universal(group) || self.matches(group, capabilities)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keep a fact group iff its key maps to a capability.
    pub fn filter_facts(
        &self,
        facts: &HashMap<String, serde_json::Value>,
        capabilities: &[String],
    ) -> HashMap<String, serde_json::Value> {
        if capabilities.is_empty() {
            return facts.clone();
        }
        facts
            .iter()
            .filter(|(key, _)| self.matches(key, capabilities))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keep rules without a category unconditionally; otherwise the
    /// category must map to a capability's domain.
    pub fn filter_rules(
        &self,
        rules: &[PolicyRule],
        capabilities: &[String],
    ) -> Vec<PolicyRule> {
        if capabilities.is_empty() {
            return rules.to_vec();
        }
        rules
            .iter()
            .filter(|rule| match &rule.category {
                None => true,
                Some(category) => self.matches(category, capabilities),
            })
            .cloned()
            .collect()
    }

    /// A key matches when it names a capability directly or falls in one
    /// of a capability's domains. Case-insensitive substring containment
    /// in either direction.
    fn matches(&self, key: &str, capabilities: &[String]) -> bool {
        let key = key.to_lowercase();
        capabilities.iter().any(|cap| {
            let cap_l = cap.to_lowercase();
            if key.contains(&cap_l) || cap_l.contains(&key) {
                return true;
            }
            self.domain_map
                .get(&cap_l)
                .is_some_and(|domains| domains.iter().any(|d| key.contains(d.as_str())))
        })
    }
}

fn is_universal(group: &str) -> bool {
    let group = group.to_lowercase();
    UNIVERSAL_GROUPS.iter().any(|u| group == *u)
}

/// How much filtering reduced the material, as a fraction in [0,1].
/// Zero when there was nothing to reduce.
pub fn effectiveness(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    ((before as f64 - after as f64) / before as f64).clamp(0.0, 1.0)
}
