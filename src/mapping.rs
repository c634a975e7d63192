//! Extension-to-folder lookup table

use crate::error::{DesktidyError, Result};
use std::collections::{BTreeSet, HashMap};

/// Key of the fallback entry used for files with no extension or an
/// unmapped one.
pub const NONAME_KEY: &str = "noname";

/// Immutable mapping from lowercase file extension (with leading dot, e.g.
/// `.pdf`) to the name of a destination folder under the watched directory.
///
/// A `noname` entry is mandatory so that [`ExtensionMap::resolve`] is total:
/// its absence is a configuration error caught at construction, not at
/// lookup time.
#[derive(Debug, Clone)]
pub struct ExtensionMap {
    entries: HashMap<String, String>,
}

impl ExtensionMap {
    /// Builds a map from raw entries, lowercasing the extension keys.
    pub fn new(entries: HashMap<String, String>) -> Result<Self> {
        let entries: HashMap<String, String> = entries
            .into_iter()
            .map(|(ext, folder)| (ext.to_lowercase(), folder))
            .collect();

        if !entries.contains_key(NONAME_KEY) {
            return Err(DesktidyError::ConfigError(format!(
                "extension mapping has no \"{}\" fallback entry",
                NONAME_KEY
            )));
        }

        Ok(Self { entries })
    }

    /// The built-in table used when the config file does not override it.
    pub fn default_mapping() -> Self {
        let entries = [
            (".png", "images"),
            (".jpg", "images"),
            (".jpeg", "images"),
            (".gif", "images"),
            (".bmp", "images"),
            (".webp", "images"),
            (".svg", "images"),
            (".ico", "images"),
            (".pdf", "documents"),
            (".doc", "documents"),
            (".docx", "documents"),
            (".xls", "documents"),
            (".xlsx", "documents"),
            (".ppt", "documents"),
            (".pptx", "documents"),
            (".odt", "documents"),
            (".txt", "text"),
            (".md", "text"),
            (".csv", "text"),
            (".json", "text"),
            (".yaml", "text"),
            (".yml", "text"),
            (".toml", "text"),
            (".mp3", "audio"),
            (".wav", "audio"),
            (".flac", "audio"),
            (".ogg", "audio"),
            (".m4a", "audio"),
            (".mp4", "video"),
            (".mkv", "video"),
            (".mov", "video"),
            (".avi", "video"),
            (".webm", "video"),
            (".zip", "archives"),
            (".tar", "archives"),
            (".gz", "archives"),
            (".rar", "archives"),
            (".7z", "archives"),
            (".exe", "programs"),
            (".msi", "programs"),
            (".appimage", "programs"),
            (".sh", "programs"),
            (NONAME_KEY, NONAME_KEY),
        ];

        Self {
            entries: entries
                .iter()
                .map(|(ext, folder)| (ext.to_string(), folder.to_string()))
                .collect(),
        }
    }

    /// Resolves an extension (leading dot included, any case) to a folder
    /// name. An empty or unmapped extension resolves to the `noname` folder.
    pub fn resolve(&self, extension: &str) -> &str {
        let extension = extension.to_lowercase();
        self.entries
            .get(&extension)
            .unwrap_or_else(|| &self.entries[NONAME_KEY])
    }

    /// Distinct destination folder names, `noname` included, in a stable
    /// order.
    pub fn folder_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.entries.values().map(String::as_str).collect();
        names.into_iter().collect()
    }

    /// True when `name` is one of the destination folders.
    pub fn is_destination(&self, name: &str) -> bool {
        self.entries.values().any(|folder| folder == name)
    }
}
