//! Operator-facing log of rows that could not be enriched
//!
//! One `title<TAB>reason` line per failed row, in catalog order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureLog {
    entries: Vec<FailureEntry>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, title: impl Into<String>, reason: impl Into<String>) {
        self.entries.push(FailureEntry {
            title: title.into(),
            reason: reason.into(),
        });
    }

    pub fn entries(&self) -> &[FailureEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given reason
    pub fn count(&self, reason: &str) -> usize {
        self.entries.iter().filter(|e| e.reason == reason).count()
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for entry in &self.entries {
            writeln!(out, "{}\t{}", single_line(&entry.title), entry.reason)?;
        }
        Ok(())
    }

    /// Write the log, replacing any previous file
    pub fn save(&self, path: &Path) -> tanda_common::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;

        tracing::info!(path = %path.display(), entries = self.len(), "Failure log written");
        Ok(())
    }
}

/// Tabs and line breaks would split the entry
fn single_line(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_in_record_order() {
        let mut log = FailureLog::new();
        log.record("Poema", "file-not-found");
        log.record("Milonga Sentimental", "no-bpm");
        log.record("Nostalgias", "out-of-range");

        let mut out = Vec::new();
        log.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Poema\tfile-not-found\nMilonga Sentimental\tno-bpm\nNostalgias\tout-of-range\n"
        );
        assert_eq!(log.count("no-bpm"), 1);
    }

    #[test]
    fn test_title_kept_on_one_line() {
        let mut log = FailureLog::new();
        log.record("Bad\tTitle\nHere", "no-bpm");

        let mut out = Vec::new();
        log.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Bad Title Here\tno-bpm\n");
    }

    #[test]
    fn test_save_empty_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("failures.log");
        FailureLog::new().save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
