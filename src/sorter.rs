//! Scanning and moving of loose top-level files

use crate::error::Result;
use crate::mapping::ExtensionMap;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One loose file found at the top level of the watched directory.
///
/// Transient: recomputed on every sort pass, never persisted.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    /// Lowercased extension with leading dot (e.g. `.pdf`), or empty.
    pub extension: String,
}

impl FileEntry {
    fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        Some(FileEntry {
            path: path.to_path_buf(),
            name,
            extension,
        })
    }
}

/// A file moved by a sort pass (or that would be, in dry-run mode).
#[derive(Debug, Clone)]
pub struct MovedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A file the pass could not move. Never aborts the pass.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one complete sort pass.
#[derive(Debug)]
pub struct SortReport {
    pub started_at: DateTime<Utc>,
    pub moved: Vec<MovedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl SortReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            moved: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// True when the pass found nothing to do: the idempotence signal.
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.skipped.is_empty()
    }
}

/// Moves loose top-level files of one directory into their mapped folders.
#[derive(Debug)]
pub struct FileSorter {
    root: PathBuf,
    mapping: ExtensionMap,
    /// Dry run mode - report planned moves without touching the filesystem
    dry_run: bool,
}

impl FileSorter {
    pub fn new(root: PathBuf, mapping: ExtensionMap) -> Self {
        Self {
            root,
            mapping,
            dry_run: false,
        }
    }

    /// Sets dry run mode
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Returns whether dry run mode is enabled
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists the loose files currently at the top level of the root.
    ///
    /// Directories (the destination folders included) and hidden files are
    /// skipped; entries that cannot be read are skipped as well.
    pub fn scan(&self) -> io::Result<Vec<FileEntry>> {
        let mut files = Vec::new();

        for entry_result in fs::read_dir(&self.root)? {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue,
            };

            let path = entry.path();

            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };

            if file_name.starts_with('.') {
                continue;
            }

            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(_) => continue,
            };

            if !metadata.is_file() {
                continue;
            }

            if let Some(file_entry) = FileEntry::from_path(&path) {
                files.push(file_entry);
            }
        }

        Ok(files)
    }

    /// Runs one complete sort pass over the root's top-level files.
    ///
    /// Each file's destination is resolved independently; a failure to move
    /// one file is recorded in the report and the pass continues. Running
    /// this on an already-sorted directory yields an empty report.
    pub fn sort_once(&self) -> Result<SortReport> {
        let mut report = SortReport::new();
        let entries = self.scan()?;

        debug!(root = %self.root.display(), files = entries.len(), "sort pass");

        for entry in entries {
            let folder_name = self.mapping.resolve(&entry.extension);
            let folder = self.root.join(folder_name);

            // A provisioned folder that has gone missing is an error
            // condition to report, not one to recover from here. Dry runs
            // never move, so they tolerate unprovisioned folders.
            if !self.dry_run && !folder.is_dir() {
                warn!(file = %entry.name, folder = %folder.display(), "destination folder missing");
                report.skipped.push(SkippedFile {
                    path: entry.path,
                    reason: format!("destination folder {} does not exist", folder.display()),
                });
                continue;
            }

            let destination = unique_destination(&folder, &entry.name);

            if self.dry_run {
                info!(from = %entry.name, to = %destination.display(), "would move (dry run)");
                report.moved.push(MovedFile {
                    from: entry.path,
                    to: destination,
                });
                continue;
            }

            match move_file(&entry.path, &destination) {
                Ok(()) => {
                    info!(from = %entry.name, to = %destination.display(), "moved");
                    report.moved.push(MovedFile {
                        from: entry.path,
                        to: destination,
                    });
                }
                Err(e) => {
                    warn!(file = %entry.name, error = %e, "move failed, skipping");
                    report.skipped.push(SkippedFile {
                        path: entry.path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Picks a destination path that does not collide with an existing file.
///
/// `report.txt` becomes `report (1).txt`, then `report (2).txt`, and so on.
/// Existing files are never overwritten.
fn unique_destination(folder: &Path, name: &str) -> PathBuf {
    let candidate = folder.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    for n in 1u32.. {
        let numbered = match ext {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = folder.join(numbered);
        if !candidate.exists() {
            return candidate;
        }
    }

    unreachable!("suffix search is unbounded")
}

/// Moves one file, preferring an atomic rename.
///
/// Falls back to copy+delete when the destination is on another volume.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ExtensionMap;
    use crate::provision::ensure_folders;
    use tempfile::TempDir;

    fn sorter_for(temp_dir: &TempDir) -> FileSorter {
        let mapping = ExtensionMap::default_mapping();
        ensure_folders(temp_dir.path(), &mapping).unwrap();
        FileSorter::new(temp_dir.path().to_path_buf(), mapping)
    }

    #[test]
    fn test_sort_once_moves_files_to_mapped_folders() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("photo.jpg"), b"jpg").unwrap();
        fs::write(root.join("notes.pdf"), b"pdf").unwrap();
        fs::write(root.join("archive.unknownext"), b"???").unwrap();

        let report = sorter_for(&temp_dir).sort_once().unwrap();

        assert_eq!(report.moved.len(), 3);
        assert!(report.skipped.is_empty());
        assert!(root.join("images").join("photo.jpg").is_file());
        assert!(root.join("documents").join("notes.pdf").is_file());
        assert!(root.join("noname").join("archive.unknownext").is_file());

        // Top level holds zero loose files afterwards
        let sorter = sorter_for(&temp_dir);
        assert!(sorter.scan().unwrap().is_empty());
    }

    #[test]
    fn test_sort_once_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photo.jpg"), b"jpg").unwrap();

        let sorter = sorter_for(&temp_dir);
        let first = sorter.sort_once().unwrap();
        let second = sorter.sort_once().unwrap();

        assert_eq!(first.moved.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_sort_once_extension_is_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("SCAN.PDF"), b"pdf").unwrap();

        sorter_for(&temp_dir).sort_once().unwrap();

        assert!(temp_dir.path().join("documents").join("SCAN.PDF").is_file());
    }

    #[test]
    fn test_sort_once_file_without_extension_goes_to_noname() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README"), b"hi").unwrap();

        sorter_for(&temp_dir).sort_once().unwrap();

        assert!(temp_dir.path().join("noname").join("README").is_file());
    }

    #[test]
    fn test_sort_once_collision_gets_numeric_suffix() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let sorter = sorter_for(&temp_dir);

        let dest = root.join("text");
        fs::write(dest.join("report.txt"), b"old").unwrap();

        fs::write(root.join("report.txt"), b"new").unwrap();
        sorter.sort_once().unwrap();

        assert!(dest.join("report.txt").is_file());
        assert!(dest.join("report (1).txt").is_file());
        assert_eq!(fs::read(dest.join("report.txt")).unwrap(), b"old");
        assert_eq!(fs::read(dest.join("report (1).txt")).unwrap(), b"new");

        // A second collision takes the next number
        fs::write(root.join("report.txt"), b"newer").unwrap();
        sorter.sort_once().unwrap();
        assert!(dest.join("report (2).txt").is_file());
    }

    #[test]
    fn test_sort_once_skips_directories_and_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let sorter = sorter_for(&temp_dir);

        fs::create_dir(root.join("project.pdf")).unwrap();
        fs::write(root.join(".hidden.pdf"), b"dot").unwrap();

        let report = sorter.sort_once().unwrap();

        assert!(report.is_empty());
        assert!(root.join("project.pdf").is_dir());
        assert!(root.join(".hidden.pdf").is_file());
    }

    #[test]
    fn test_sort_once_dry_run_moves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let mut sorter = sorter_for(&temp_dir);
        sorter.set_dry_run(true);

        fs::write(root.join("photo.jpg"), b"jpg").unwrap();

        let report = sorter.sort_once().unwrap();

        assert_eq!(report.moved.len(), 1);
        assert!(root.join("photo.jpg").is_file());
        assert!(!root.join("images").join("photo.jpg").exists());
    }

    #[test]
    fn test_sort_once_dry_run_needs_no_provisioned_folders() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let mut sorter = FileSorter::new(root.to_path_buf(), ExtensionMap::default_mapping());
        sorter.set_dry_run(true);

        fs::write(root.join("photo.jpg"), b"jpg").unwrap();

        let report = sorter.sort_once().unwrap();

        assert_eq!(report.moved.len(), 1);
        assert!(report.skipped.is_empty());
        assert!(!root.join("images").exists());
    }

    #[test]
    fn test_sort_once_missing_destination_is_reported_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let sorter = sorter_for(&temp_dir);

        fs::remove_dir(root.join("images")).unwrap();
        fs::write(root.join("photo.jpg"), b"jpg").unwrap();
        fs::write(root.join("notes.pdf"), b"pdf").unwrap();

        let report = sorter.sort_once().unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.moved.len(), 1);
        assert!(root.join("photo.jpg").is_file());
        assert!(root.join("documents").join("notes.pdf").is_file());
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README"), b"a").unwrap();

        let dest = unique_destination(temp_dir.path(), "README");
        assert_eq!(dest, temp_dir.path().join("README (1)"));
    }

    #[test]
    fn test_scan_lists_only_loose_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let sorter = sorter_for(&temp_dir);

        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("b.jpg"), b"b").unwrap();

        let files = sorter.scan().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(files.len(), 2);
        assert!(names.contains(&"a.txt"));
        assert!(names.contains(&"b.jpg"));
        assert_eq!(
            files.iter().find(|f| f.name == "b.jpg").unwrap().extension,
            ".jpg"
        );
    }
}
