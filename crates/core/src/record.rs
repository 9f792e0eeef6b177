//! The six-dimension context record — WHO/WHAT/WHERE/WHEN/WHY/HOW.
//!
//! One record exists per (scope level, scope entity). The fifteen fields
//! are described by a declarative table ([`Field::ALL`]) so the merge and
//! provenance logic iterate over field descriptors instead of repeating
//! one statement per field.

use crate::entity::ScopeLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Field table ───────────────────────────────────────────────────────────

/// The six dimension groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Who,
    What,
    Where,
    When,
    Why,
    How,
}

/// The storage shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordered list of strings.
    List,
    /// Optional free-form string; whitespace-only counts as absent.
    Text,
    /// Optional timestamp.
    Timestamp,
}

/// One of the fifteen record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // WHO
    EndUsers,
    Implementers,
    Reviewers,
    // WHAT
    FunctionalRequirements,
    TechnicalConstraints,
    AcceptanceCriteria,
    // WHERE
    AffectedServices,
    Repositories,
    DeploymentTargets,
    // WHEN
    Deadline,
    DependenciesTimeline,
    // WHY
    BusinessValue,
    RiskIfDelayed,
    // HOW
    SuggestedApproach,
    ExistingPatterns,
}

impl Field {
    /// All fifteen fields in canonical order.
    pub const ALL: [Field; 15] = [
        Field::EndUsers,
        Field::Implementers,
        Field::Reviewers,
        Field::FunctionalRequirements,
        Field::TechnicalConstraints,
        Field::AcceptanceCriteria,
        Field::AffectedServices,
        Field::Repositories,
        Field::DeploymentTargets,
        Field::Deadline,
        Field::DependenciesTimeline,
        Field::BusinessValue,
        Field::RiskIfDelayed,
        Field::SuggestedApproach,
        Field::ExistingPatterns,
    ];

    /// The storage shape of this field.
    pub fn kind(self) -> FieldKind {
        match self {
            Field::Deadline => FieldKind::Timestamp,
            Field::BusinessValue
            | Field::RiskIfDelayed
            | Field::SuggestedApproach => FieldKind::Text,
            _ => FieldKind::List,
        }
    }

    /// The dimension group this field belongs to.
    pub fn dimension(self) -> Dimension {
        match self {
            Field::EndUsers | Field::Implementers | Field::Reviewers => Dimension::Who,
            Field::FunctionalRequirements
            | Field::TechnicalConstraints
            | Field::AcceptanceCriteria => Dimension::What,
            Field::AffectedServices | Field::Repositories | Field::DeploymentTargets => {
                Dimension::Where
            }
            Field::Deadline | Field::DependenciesTimeline => Dimension::When,
            Field::BusinessValue | Field::RiskIfDelayed => Dimension::Why,
            Field::SuggestedApproach | Field::ExistingPatterns => Dimension::How,
        }
    }

    /// Stable snake_case name, used in provenance diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Field::EndUsers => "end_users",
            Field::Implementers => "implementers",
            Field::Reviewers => "reviewers",
            Field::FunctionalRequirements => "functional_requirements",
            Field::TechnicalConstraints => "technical_constraints",
            Field::AcceptanceCriteria => "acceptance_criteria",
            Field::AffectedServices => "affected_services",
            Field::Repositories => "repositories",
            Field::DeploymentTargets => "deployment_targets",
            Field::Deadline => "deadline",
            Field::DependenciesTimeline => "dependencies_timeline",
            Field::BusinessValue => "business_value",
            Field::RiskIfDelayed => "risk_if_delayed",
            Field::SuggestedApproach => "suggested_approach",
            Field::ExistingPatterns => "existing_patterns",
        }
    }
}

// ── The record itself ─────────────────────────────────────────────────────

/// The fifteen WHO/WHAT/WHERE/WHEN/WHY/HOW fields of one context record.
///
/// Also the shape of the merged record an assembly call synthesizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SixDimensions {
    // WHO
    #[serde(default)]
    pub end_users: Vec<String>,
    #[serde(default)]
    pub implementers: Vec<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,

    // WHAT
    #[serde(default)]
    pub functional_requirements: Vec<String>,
    #[serde(default)]
    pub technical_constraints: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    // WHERE
    #[serde(default)]
    pub affected_services: Vec<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub deployment_targets: Vec<String>,

    // WHEN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dependencies_timeline: Vec<String>,

    // WHY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_if_delayed: Option<String>,

    // HOW
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_approach: Option<String>,
    #[serde(default)]
    pub existing_patterns: Vec<String>,
}

impl SixDimensions {
    /// The list value of a field. Empty for non-list fields.
    pub fn list(&self, field: Field) -> &[String] {
        match field {
            Field::EndUsers => &self.end_users,
            Field::Implementers => &self.implementers,
            Field::Reviewers => &self.reviewers,
            Field::FunctionalRequirements => &self.functional_requirements,
            Field::TechnicalConstraints => &self.technical_constraints,
            Field::AcceptanceCriteria => &self.acceptance_criteria,
            Field::AffectedServices => &self.affected_services,
            Field::Repositories => &self.repositories,
            Field::DeploymentTargets => &self.deployment_targets,
            Field::DependenciesTimeline => &self.dependencies_timeline,
            Field::ExistingPatterns => &self.existing_patterns,
            Field::Deadline
            | Field::BusinessValue
            | Field::RiskIfDelayed
            | Field::SuggestedApproach => &[],
        }
    }

    /// The text value of a field. `None` for non-text fields.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::BusinessValue => self.business_value.as_deref(),
            Field::RiskIfDelayed => self.risk_if_delayed.as_deref(),
            Field::SuggestedApproach => self.suggested_approach.as_deref(),
            _ => None,
        }
    }

    /// Replace a list field. Ignored for non-list fields.
    pub fn set_list(&mut self, field: Field, values: Vec<String>) {
        match field {
            Field::EndUsers => self.end_users = values,
            Field::Implementers => self.implementers = values,
            Field::Reviewers => self.reviewers = values,
            Field::FunctionalRequirements => self.functional_requirements = values,
            Field::TechnicalConstraints => self.technical_constraints = values,
            Field::AcceptanceCriteria => self.acceptance_criteria = values,
            Field::AffectedServices => self.affected_services = values,
            Field::Repositories => self.repositories = values,
            Field::DeploymentTargets => self.deployment_targets = values,
            Field::DependenciesTimeline => self.dependencies_timeline = values,
            Field::ExistingPatterns => self.existing_patterns = values,
            Field::Deadline
            | Field::BusinessValue
            | Field::RiskIfDelayed
            | Field::SuggestedApproach => {}
        }
    }

    /// Replace a text field. Ignored for non-text fields.
    pub fn set_text(&mut self, field: Field, value: Option<String>) {
        match field {
            Field::BusinessValue => self.business_value = value,
            Field::RiskIfDelayed => self.risk_if_delayed = value,
            Field::SuggestedApproach => self.suggested_approach = value,
            _ => {}
        }
    }

    /// Whether a field carries a value: a non-empty list, a non-blank
    /// string, or a present timestamp.
    pub fn is_populated(&self, field: Field) -> bool {
        match field.kind() {
            FieldKind::List => !self.list(field).is_empty(),
            FieldKind::Text => self.text(field).is_some_and(|t| !t.trim().is_empty()),
            FieldKind::Timestamp => self.deadline.is_some(),
        }
    }

    /// Count of populated fields out of fifteen.
    pub fn populated_count(&self) -> usize {
        Field::ALL.iter().filter(|f| self.is_populated(**f)).count()
    }
}

// ── Stored record wrapper ─────────────────────────────────────────────────

/// A six-dimension record as the store holds it: the dimensions plus the
/// scope it is attached to and the assembly bookkeeping written back after
/// a refresh. This core reads records; the only mutation it ever performs
/// is the terminal timestamp/score write via
/// [`crate::store::ContextStore::record_assembly`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: String,
    pub scope_level: ScopeLevel,
    pub scope_id: String,
    pub dimensions: SixDimensions,

    /// Cached external facts. Populated by out-of-scope collaborators on
    /// project-level records; the pipeline reads it in preference to an
    /// empty map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts_cache: Option<HashMap<String, serde_json::Value>>,

    /// When this record last had a payload assembled against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,

    /// Confidence total recorded at the last refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ContextRecord {
    /// An empty record for a scope — what the pipeline substitutes when
    /// the store has nothing recorded at that level.
    pub fn empty(scope_level: ScopeLevel, scope_id: &str) -> Self {
        Self {
            id: String::new(),
            scope_level,
            scope_id: scope_id.to_string(),
            dimensions: SixDimensions::default(),
            facts_cache: None,
            refreshed_at: None,
            confidence: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_table_covers_fifteen_fields() {
        assert_eq!(Field::ALL.len(), 15);
        let lists = Field::ALL.iter().filter(|f| f.kind() == FieldKind::List).count();
        let texts = Field::ALL.iter().filter(|f| f.kind() == FieldKind::Text).count();
        let stamps = Field::ALL
            .iter()
            .filter(|f| f.kind() == FieldKind::Timestamp)
            .count();
        assert_eq!((lists, texts, stamps), (11, 3, 1));
    }

    #[test]
    fn dimensions_group_correctly() {
        assert_eq!(Field::EndUsers.dimension(), Dimension::Who);
        assert_eq!(Field::AcceptanceCriteria.dimension(), Dimension::What);
        assert_eq!(Field::Repositories.dimension(), Dimension::Where);
        assert_eq!(Field::Deadline.dimension(), Dimension::When);
        assert_eq!(Field::RiskIfDelayed.dimension(), Dimension::Why);
        assert_eq!(Field::ExistingPatterns.dimension(), Dimension::How);
    }

    #[test]
    fn blank_text_is_not_populated() {
        let mut dims = SixDimensions::default();
        dims.business_value = Some("   ".into());
        assert!(!dims.is_populated(Field::BusinessValue));

        dims.business_value = Some("grow revenue".into());
        assert!(dims.is_populated(Field::BusinessValue));
    }

    #[test]
    fn empty_list_is_not_populated() {
        let mut dims = SixDimensions::default();
        assert!(!dims.is_populated(Field::Reviewers));
        dims.reviewers.push("alex".into());
        assert!(dims.is_populated(Field::Reviewers));
    }

    #[test]
    fn deadline_populates_via_timestamp() {
        let mut dims = SixDimensions::default();
        assert!(!dims.is_populated(Field::Deadline));
        dims.deadline = Some(Utc::now());
        assert!(dims.is_populated(Field::Deadline));
    }

    #[test]
    fn populated_count_tracks_fields() {
        let mut dims = SixDimensions::default();
        assert_eq!(dims.populated_count(), 0);
        dims.end_users.push("ops team".into());
        dims.suggested_approach = Some("incremental rollout".into());
        dims.deadline = Some(Utc::now());
        assert_eq!(dims.populated_count(), 3);
    }

    #[test]
    fn generic_accessors_roundtrip() {
        let mut dims = SixDimensions::default();
        dims.set_list(Field::Repositories, vec!["core".into(), "api".into()]);
        assert_eq!(dims.list(Field::Repositories), ["core", "api"]);

        dims.set_text(Field::RiskIfDelayed, Some("contract penalty".into()));
        assert_eq!(dims.text(Field::RiskIfDelayed), Some("contract penalty"));

        // Mismatched kinds are inert, not panics.
        dims.set_list(Field::BusinessValue, vec!["ignored".into()]);
        assert!(dims.business_value.is_none());
        assert!(dims.list(Field::BusinessValue).is_empty());
    }

    #[test]
    fn empty_record_has_no_bookkeeping() {
        let rec = ContextRecord::empty(ScopeLevel::Task, "t1");
        assert!(rec.id.is_empty());
        assert_eq!(rec.scope_id, "t1");
        assert!(rec.refreshed_at.is_none());
        assert_eq!(rec.dimensions.populated_count(), 0);
    }

    #[test]
    fn record_serialization_roundtrip() {
        let mut rec = ContextRecord::empty(ScopeLevel::Project, "p1");
        rec.id = "ctx_1".into();
        rec.dimensions.business_value = Some("retention".into());
        rec.facts_cache = Some(HashMap::from([(
            "architecture".to_string(),
            serde_json::json!({"style": "event-driven", "services": 4}),
        )]));

        let json = serde_json::to_string(&rec).unwrap();
        let back: ContextRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "ctx_1");
        assert_eq!(back.dimensions.business_value.as_deref(), Some("retention"));
        assert!(back.facts_cache.unwrap().contains_key("architecture"));
    }
}
