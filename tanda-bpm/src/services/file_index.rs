//! Canonical key → audio file index
//!
//! Built once per run from a directory scan, read-only afterwards. Every
//! audio file contributes two keys: its whole stem, and its base title (track
//! number stripped, cut at the first dash). When two files produce the same
//! key the file scanned last wins; the scanner's sorted traversal keeps that
//! choice stable between runs.

use crate::normalize::{base_title, normalize, strip_track_number, CanonicalKey};
use crate::services::file_scanner::{FileScanner, ScanError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Immutable mapping from canonical key to audio file path
#[derive(Debug, Clone)]
pub struct FileIndex {
    root: PathBuf,
    entries: BTreeMap<CanonicalKey, PathBuf>,
    file_count: usize,
    collisions: usize,
}

impl FileIndex {
    /// Scan `root` and index every audio file under it
    pub fn build(root: &Path) -> Result<Self, ScanError> {
        Self::build_with(&FileScanner::new(), root)
    }

    /// Index using a preconfigured scanner
    pub fn build_with(scanner: &FileScanner, root: &Path) -> Result<Self, ScanError> {
        let files = scanner.scan(root)?;
        let index = Self::from_files(root, files);

        tracing::info!(
            root = %root.display(),
            files = index.file_count,
            keys = index.len(),
            collisions = index.collisions,
            "Audio index built"
        );

        Ok(index)
    }

    /// Index an explicit list of files, in the given order
    pub fn from_files<I>(root: &Path, files: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut index = Self {
            root: root.to_path_buf(),
            entries: BTreeMap::new(),
            file_count: 0,
            collisions: 0,
        };

        for path in files {
            index.file_count += 1;
            for key in file_keys(&path) {
                index.insert(key, path.clone());
            }
        }

        index
    }

    fn insert(&mut self, key: CanonicalKey, path: PathBuf) {
        if let Some(previous) = self.entries.insert(key.clone(), path) {
            if previous != self.entries[&key] {
                self.collisions += 1;
                tracing::debug!(
                    key = %key,
                    replaced = %previous.display(),
                    "Duplicate canonical key, keeping last scanned file"
                );
            }
        }
    }

    /// Path indexed under `key`
    pub fn get(&self, key: &CanonicalKey) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.entries.keys()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of audio files indexed
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Keys that were overwritten by a different file
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Scan root the index was built from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `path` relative to the scan root, with forward slashes
    ///
    /// Paths outside the root are returned whole.
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }
}

/// Keys for one audio file: whole stem and base title, empty keys dropped
pub fn file_keys(path: &Path) -> Vec<CanonicalKey> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut keys = Vec::with_capacity(2);
    for key in [
        normalize(&stem),
        normalize(&base_title(&strip_track_number(&stem))),
    ] {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
