//! Policy rule selection and compressed summarization.
//!
//! The payload carries the applicable rules three ways: the full set, the
//! BLOCK-only subset, and a compressed text summary grouped by
//! enforcement level with per-level caps so the summary stays bounded no
//! matter how rule-happy a project is.

use taskbrief_core::policy::{EnforcementLevel, PolicyRule};

const MAX_DESCRIPTION: usize = 80;
const CAP_BLOCK: usize = 15;
const CAP_LIMIT: usize = 10;
const CAP_GUIDE: usize = 5;

/// The rules applicable to a task of the given type. A rule with no type
/// restriction applies universally.
pub fn applicable(rules: Vec<PolicyRule>, task_type: Option<&str>) -> Vec<PolicyRule> {
    rules
        .into_iter()
        .filter(|r| r.applies_to(task_type))
        .collect()
}

/// The BLOCK-enforced subset.
pub fn blocking(rules: &[PolicyRule]) -> Vec<PolicyRule> {
    rules
        .iter()
        .filter(|r| r.enforcement == EnforcementLevel::Block)
        .cloned()
        .collect()
}

/// Render the compressed summary: BLOCK first (capped at 15), then LIMIT
/// (10), then GUIDE (5), then a one-line ENHANCE count. Overflow shows as
/// a `(+N more)` suffix line.
pub fn summarize(rules: &[PolicyRule]) -> String {
    let mut out = String::new();

    render_level(&mut out, rules, EnforcementLevel::Block, CAP_BLOCK);
    render_level(&mut out, rules, EnforcementLevel::Limit, CAP_LIMIT);
    render_level(&mut out, rules, EnforcementLevel::Guide, CAP_GUIDE);

    let enhance = rules
        .iter()
        .filter(|r| r.enforcement == EnforcementLevel::Enhance)
        .count();
    if enhance > 0 {
        out.push_str(&format!("ENHANCE: {enhance} rule(s)\n"));
    }

    out.trim_end().to_string()
}

fn render_level(out: &mut String, rules: &[PolicyRule], level: EnforcementLevel, cap: usize) {
    let matching: Vec<&PolicyRule> = rules.iter().filter(|r| r.enforcement == level).collect();
    if matching.is_empty() {
        return;
    }

    out.push_str(&format!("{level}:\n"));
    for rule in matching.iter().take(cap) {
        out.push_str(&format!(
            "- [{}] {}: {}\n",
            rule.id,
            rule.name,
            truncate(&rule.description)
        ));
    }
    if matching.len() > cap {
        out.push_str(&format!("  (+{} more)\n", matching.len() - cap));
    }
}

/// Truncate a description to 80 characters with an ellipsis.
fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_DESCRIPTION).collect();
    format!("{cut}...")
}
