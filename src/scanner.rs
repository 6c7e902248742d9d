/*!
 * Directory and file scanning functionality
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::ensure;
use crate::error::Result;
use crate::types::{FileEntry, ScanResult};

/// Scanner for a source directory
pub struct Scanner {
    /// Directory to scan
    root: PathBuf,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(root: impl Into<PathBuf>, progress: Arc<ProgressBar>) -> Self {
        Self {
            root: root.into(),
            progress,
        }
    }

    /// Check that the root exists and is a directory
    pub fn validate(&self) -> Result<()> {
        validate_source(&self.root)
    }

    /// Scan the root directory recursively
    pub fn scan(&self) -> Result<ScanResult> {
        self.validate()?;
        let abs_root = std::path::absolute(&self.root)?;
        let mut result = ScanResult::new(&abs_root);

        for entry in WalkDir::new(&abs_root)
            .follow_links(false)
            .sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let rel_path = match entry.path().strip_prefix(&abs_root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };

            if entry.file_type().is_dir() {
                result.directories.entry(rel_path).or_default();
                continue;
            }

            // Links are not followed into directories, but linked files are packaged
            let is_file = if entry.path_is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(metadata) => metadata.is_file(),
                    Err(e) => {
                        warn!("Skipping broken link {}: {}", entry.path().display(), e);
                        continue;
                    }
                }
            } else {
                entry.file_type().is_file()
            };
            if !is_file {
                debug!("Skipping {}: not a regular file", entry.path().display());
                continue;
            }

            match self.process_file(entry.path()) {
                Ok(file) => {
                    let parent = rel_path.parent().unwrap_or(Path::new("")).to_path_buf();
                    result.directories.entry(parent).or_default().push(file);
                }
                Err(e) => warn!("Error processing {}: {}", entry.path().display(), e),
            }
        }

        Ok(result)
    }

    /// Describe a single file
    fn process_file(&self, abs_path: &Path) -> Result<FileEntry> {
        let name = abs_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        self.progress.inc(1);
        self.progress.set_message(format!("Current file: {}", name));

        let size = fs::metadata(abs_path)?.len();

        Ok(FileEntry {
            name,
            path: abs_path.to_path_buf(),
            size,
        })
    }
}

/// Check that a source directory exists and is a directory
pub fn validate_source(root: &Path) -> Result<()> {
    ensure!(
        root.is_dir(),
        InvalidSource,
        "'{}' does not exist or is not a directory",
        root.display()
    );
    Ok(())
}
