//! Audio file scanner
//!
//! Recursive discovery of audio files under the scan root, filtered by a
//! fixed extension allow-list. Traversal is sorted by file name so two scans
//! of the same tree visit files in the same order. Symlinks to files are
//! picked up; symlinked directories are not descended into.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Extensions accepted as audio (lower-case, without dot)
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "flac", "m4a", "wav", "ogg"];

/// Audio file scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Scan result with statistics
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Audio files in traversal order
    pub files: Vec<PathBuf>,
    /// Count of files by extension
    pub by_format: BTreeMap<String, usize>,
    /// Entries that could not be read
    pub errors: Vec<String>,
}

/// Audio file scanner
pub struct FileScanner {
    ignore_patterns: Vec<String>,
    max_depth: Option<usize>,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FileScanner {
    /// Create new file scanner with default ignore patterns
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, etc.
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
                "@eaDir".to_string(),
            ],
            max_depth: None,
        }
    }

    /// Limit traversal depth (1 = files directly under the root)
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Scan directory for audio files
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        Ok(self.scan_with_stats(root_path)?.files)
    }

    /// Scan with per-format counts and unreadable entries
    pub fn scan_with_stats(&self, root_path: &Path) -> Result<ScanResult, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let mut result = ScanResult::default();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !is_file_or_file_link(&entry) {
                        continue;
                    }
                    if let Some(ext) = audio_extension(entry.path()) {
                        *result.by_format.entry(ext).or_insert(0) += 1;
                        result.files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    result.errors.push(e.to_string());
                }
            }
        }

        tracing::debug!(
            root = %root_path.display(),
            files = result.files.len(),
            errors = result.errors.len(),
            "Audio scan complete"
        );

        Ok(result)
    }

    /// Whole-name match against the ignore list
    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|pattern| file_name == pattern.as_str())
    }
}

/// Regular file, or a symlink whose target is a regular file
fn is_file_or_file_link(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

/// Lower-cased extension if it is on the audio allow-list
pub fn audio_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    AUDIO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
