//! Amalgamation discovery — grouping generated reference files by type.
//!
//! A project's amalgamation directory holds pre-generated reference files
//! named `amalgamated_<type>.<ext>` (or the short `amalg_` prefix). The
//! scan groups them into a map keyed by the derived type name. This is
//! the only filesystem discovery the pipeline performs; producing the
//! files is an out-of-scope collaborator's job.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename prefixes recognized as amalgamation markers.
const RECOGNIZED_PREFIXES: [&str; 2] = ["amalgamated_", "amalg_"];

/// Scan a directory into a type-keyed file-path map.
///
/// A missing directory or unreadable entry yields an empty (or smaller)
/// map, never an error — absence is a scoring signal, not a failure.
pub fn scan(dir: &Path) -> HashMap<String, Vec<PathBuf>> {
    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            debug!(dir = %dir.display(), "no amalgamation directory");
            return groups;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        groups
            .entry(derive_type(name).to_string())
            .or_default()
            .push(path);
    }

    // Deterministic order within each group.
    for paths in groups.values_mut() {
        paths.sort();
    }
    groups
}

/// The file-type name: the stem with a recognized prefix stripped.
/// Unprefixed files group under their full stem.
pub fn derive_type(stem: &str) -> &str {
    for prefix in RECOGNIZED_PREFIXES {
        if let Some(rest) = stem.strip_prefix(prefix) {
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_derivation_strips_recognized_prefixes() {
        assert_eq!(derive_type("amalgamated_api"), "api");
        assert_eq!(derive_type("amalg_frontend"), "frontend");
        assert_eq!(derive_type("notes"), "notes");
        // A bare prefix keeps its stem rather than deriving an empty type.
        assert_eq!(derive_type("amalg_"), "amalg_");
    }

    #[test]
    fn missing_directory_scans_empty() {
        let groups = scan(Path::new("/definitely/not/here"));
        assert!(groups.is_empty());
    }

    #[test]
    fn files_group_by_derived_type() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "amalgamated_api.md",
            "amalgamated_api.txt",
            "amalg_database.md",
            "readme.md",
        ] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let groups = scan(dir.path());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["api"].len(), 2);
        assert_eq!(groups["database"].len(), 1);
        assert_eq!(groups["readme"].len(), 1);
        // Directories are skipped.
        assert!(!groups.contains_key("subdir"));
    }
}
