//! Role assignments — what a role is allowed to see and where its SOP lives.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A role as the registry resolves it for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: String,

    /// Inactive assignments abort assembly; the role exists but must not
    /// be used.
    pub active: bool,

    /// Capability strings used by the role filter. An empty list disables
    /// filtering entirely.
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Custom SOP file location. When absent the loader falls back to the
    /// convention path derived from the role name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sop_path: Option<PathBuf>,
}

impl RoleAssignment {
    /// An active assignment with no capabilities and no custom SOP path.
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            active: true,
            capabilities: Vec::new(),
            sop_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_assignment_is_active_and_unfiltered() {
        let a = RoleAssignment::new("backend-dev");
        assert!(a.active);
        assert!(a.capabilities.is_empty());
        assert!(a.sop_path.is_none());
    }
}
