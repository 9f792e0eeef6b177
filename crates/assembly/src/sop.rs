//! Role SOP loading with an mtime-keyed content cache.
//!
//! Resolution order for a role's standard-operating-procedure text:
//! 1. a custom path recorded on the role assignment, when the registry
//!    resolves the role;
//! 2. the convention path `<sop_dir>/<role-slug>.md`;
//! 3. neither exists → `None` (a warning upstream, never an error).
//!
//! An *inactive* role assignment is fatal — the role exists but must not
//! be used — and is distinct from a missing file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;
use taskbrief_core::error::{Error, Result};
use taskbrief_core::store::ContextStore;
use tracing::debug;

struct CachedSop {
    modified: SystemTime,
    text: String,
}

/// Loads and caches role SOP text from the filesystem.
pub struct SopLoader {
    sop_dir: PathBuf,
    /// Content cache keyed by role name, invalidated by source mtime.
    cache: RwLock<HashMap<String, CachedSop>>,
}

impl SopLoader {
    pub fn new(sop_dir: PathBuf) -> Self {
        Self {
            sop_dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load the SOP text for a role, or `None` when no file exists.
    ///
    /// Fails only when the registry knows the role and marks it inactive.
    pub fn load(
        &self,
        project_id: &str,
        role: &str,
        store: &dyn ContextStore,
    ) -> Result<Option<String>> {
        // A registry resolution failure means no registry is available;
        // the convention path still applies.
        let assignment = store.resolve_role(project_id, role).ok().flatten();

        let custom_path = match &assignment {
            Some(a) if !a.active => {
                return Err(Error::RoleInactive {
                    role: role.to_string(),
                });
            }
            Some(a) => a.sop_path.clone(),
            None => None,
        };

        let path = custom_path.unwrap_or_else(|| self.convention_path(role));
        if !path.exists() {
            debug!(role, path = %path.display(), "no SOP file");
            return Ok(None);
        }
        Ok(Some(self.read_cached(role, &path)))
    }

    /// The convention path derived from the role name: lowercased, spaces
    /// collapsed to underscores, `.md` extension.
    pub fn convention_path(&self, role: &str) -> PathBuf {
        let slug: String = role
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        self.sop_dir.join(format!("{slug}.md"))
    }

    /// Read through the cache: an unchanged modification time returns the
    /// cached text, a changed one forces a re-read.
    fn read_cached(&self, role: &str, path: &Path) -> String {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        if let Some(cached) = self.cache.read().unwrap().get(role) {
            if cached.modified == modified {
                debug!(role, "SOP cache hit");
                return cached.text.clone();
            }
        }

        let text = std::fs::read_to_string(path).unwrap_or_default();
        self.cache.write().unwrap().insert(
            role.to_string(),
            CachedSop {
                modified,
                text: text.clone(),
            },
        );
        text
    }
}
