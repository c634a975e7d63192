//! Destination folder provisioning

use crate::error::{DesktidyError, Result};
use crate::mapping::ExtensionMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of one provisioning run.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    /// Folders created by this run.
    pub created: Vec<PathBuf>,
    /// Folders that already existed.
    pub existing: Vec<PathBuf>,
    /// Folders that could not be created, with the reason.
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

impl ProvisionReport {
    /// True when at least one destination folder is usable.
    pub fn any_usable(&self) -> bool {
        !self.created.is_empty() || !self.existing.is_empty()
    }
}

/// Creates `root/<folder>` for every distinct folder the mapping references.
///
/// Best-effort: a failure on one folder is recorded and the rest are still
/// attempted. Pre-existing folders count as success, so calling this on
/// every startup is safe. Only the case where zero folders end up usable is
/// an error.
pub fn ensure_folders(root: &Path, mapping: &ExtensionMap) -> Result<ProvisionReport> {
    let mut report = ProvisionReport::default();

    for name in mapping.folder_names() {
        let folder = root.join(name);
        if folder.is_dir() {
            report.existing.push(folder);
            continue;
        }

        match fs::create_dir_all(&folder) {
            Ok(()) => {
                debug!(folder = %folder.display(), "created destination folder");
                report.created.push(folder);
            }
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "failed to create destination folder");
                report.failed.push((folder, e));
            }
        }
    }

    if !report.any_usable() {
        return Err(DesktidyError::ProvisionError {
            root: root.to_path_buf(),
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_folders_creates_all_destinations() {
        let temp_dir = TempDir::new().unwrap();
        let mapping = ExtensionMap::default_mapping();

        let report = ensure_folders(temp_dir.path(), &mapping).unwrap();

        assert!(report.failed.is_empty());
        for name in mapping.folder_names() {
            assert!(temp_dir.path().join(name).is_dir());
        }
    }

    #[test]
    fn test_ensure_folders_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mapping = ExtensionMap::default_mapping();

        let first = ensure_folders(temp_dir.path(), &mapping).unwrap();
        let second = ensure_folders(temp_dir.path(), &mapping).unwrap();

        assert!(second.created.is_empty());
        assert!(second.failed.is_empty());
        assert_eq!(second.existing.len(), first.created.len() + first.existing.len());
    }

    #[test]
    fn test_ensure_folders_records_failure_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let mapping = ExtensionMap::default_mapping();

        // A regular file squatting on a destination name makes that one fail
        std::fs::write(temp_dir.path().join("images"), b"not a folder").unwrap();

        let report = ensure_folders(temp_dir.path(), &mapping).unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("images"));
        assert!(temp_dir.path().join("documents").is_dir());
        assert!(temp_dir.path().join("noname").is_dir());
    }

    #[test]
    fn test_ensure_folders_errors_when_nothing_usable() {
        // A regular file as the root makes every create fail
        let temp_dir = TempDir::new().unwrap();
        let not_a_dir = temp_dir.path().join("root");
        std::fs::write(&not_a_dir, b"file").unwrap();

        let mapping = ExtensionMap::default_mapping();
        let result = ensure_folders(&not_a_dir, &mapping);
        assert!(matches!(result, Err(DesktidyError::ProvisionError { .. })));
    }
}
