/*!
 * Core types and data structures for wixgen
 */

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A regular file found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name
    pub name: String,
    /// Absolute source path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Result of scanning a source directory
///
/// Maps each relative directory path (the empty path is the root) to the
/// files it directly contains. Directories without files are still present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Absolute root that was scanned
    pub root: PathBuf,
    /// Relative directory path -> files
    pub directories: BTreeMap<PathBuf, Vec<FileEntry>>,
}

impl ScanResult {
    /// Create an empty scan result for a root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            directories: BTreeMap::new(),
        }
    }

    /// Files directly contained in a relative directory
    pub fn files_in(&self, rel_dir: impl AsRef<Path>) -> &[FileEntry] {
        self.directories
            .get(rel_dir.as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over every file with its relative directory
    pub fn iter_files(&self) -> impl Iterator<Item = (&Path, &FileEntry)> {
        self.directories
            .iter()
            .flat_map(|(dir, files)| files.iter().map(move |f| (dir.as_path(), f)))
    }

    /// Number of files
    pub fn file_count(&self) -> usize {
        self.directories.values().map(Vec::len).sum()
    }

    /// Number of directories below the root
    pub fn directory_count(&self) -> usize {
        self.directories
            .keys()
            .filter(|k| !k.as_os_str().is_empty())
            .count()
    }

    /// Total payload size in bytes
    pub fn total_size(&self) -> u64 {
        self.iter_files().map(|(_, f)| f.size).sum()
    }
}
