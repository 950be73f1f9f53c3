//! Track catalog stored as CSV
//!
//! The catalog is a spreadsheet export with at least a `Title` column and
//! usually a `Genre` column. Enrichment adds or overwrites `BPM` and
//! `BPMNote`; every other column passes through untouched, in its original
//! position. Output is UTF-8 with a BOM so spreadsheet tools pick the
//! encoding up.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tanda_common::{Error, Result};

pub const TITLE_COLUMN: &str = "Title";
pub const GENRE_COLUMN: &str = "Genre";
pub const BPM_COLUMN: &str = "BPM";
pub const NOTE_COLUMN: &str = "BPMNote";

const BOM: &str = "\u{feff}";

/// The fields enrichment reads and writes
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub title: String,
    /// Free-text genre, empty when the column is missing
    pub genre: String,
    pub bpm: Option<f64>,
    pub bpm_note: String,
}

impl CatalogRow {
    pub fn new(title: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genre: genre.into(),
            bpm: None,
            bpm_note: String::new(),
        }
    }

    /// BPM as stored: empty or one decimal place
    pub fn bpm_cell(&self) -> String {
        self.bpm.map(|bpm| format!("{:.1}", bpm)).unwrap_or_default()
    }
}

/// In-memory CSV table
#[derive(Debug, Clone)]
pub struct Catalog {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
    title_col: usize,
    genre_col: Option<usize>,
    bpm_col: usize,
    note_col: usize,
}

impl Catalog {
    /// Load a catalog file
    ///
    /// # Errors
    /// * `NotFound` if the file does not exist
    /// * `InvalidInput` if there is no `Title` column or a row is too long
    /// * `Csv` / `Io` for malformed or unreadable files
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "catalog file {}",
                path.display()
            )));
        }

        let catalog = Self::from_reader(File::open(path)?)?;
        tracing::info!(
            path = %path.display(),
            rows = catalog.len(),
            columns = catalog.headers.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse CSV text; a leading BOM is ignored
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let body = text.strip_prefix(BOM).unwrap_or(&text);

        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());

        let mut headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let title_col = column(&headers, TITLE_COLUMN).ok_or_else(|| {
            Error::InvalidInput(format!("catalog has no '{}' column", TITLE_COLUMN))
        })?;
        let genre_col = column(&headers, GENRE_COLUMN);

        let original_width = headers.len();
        let mut records = Vec::new();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() > original_width {
                return Err(Error::InvalidInput(format!(
                    "catalog row {} has {} fields, header has {}",
                    line + 1,
                    record.len(),
                    original_width
                )));
            }
            let mut fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            fields.resize(original_width, String::new());
            records.push(fields);
        }

        let bpm_col = ensure_column(&mut headers, &mut records, BPM_COLUMN);
        let note_col = ensure_column(&mut headers, &mut records, NOTE_COLUMN);

        Ok(Self {
            headers,
            records,
            title_col,
            genre_col,
            bpm_col,
            note_col,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw cell value
    pub fn cell(&self, idx: usize, column_name: &str) -> Option<&str> {
        let col = column(&self.headers, column_name)?;
        self.records.get(idx).map(|r| r[col].as_str())
    }

    /// Enrichment view of row `idx`
    pub fn row(&self, idx: usize) -> Option<CatalogRow> {
        let record = self.records.get(idx)?;
        Some(CatalogRow {
            title: record[self.title_col].clone(),
            genre: self
                .genre_col
                .map(|c| record[c].clone())
                .unwrap_or_default(),
            bpm: record[self.bpm_col].trim().parse().ok(),
            bpm_note: record[self.note_col].clone(),
        })
    }

    /// All rows in file order
    pub fn rows(&self) -> Vec<CatalogRow> {
        (0..self.len()).filter_map(|idx| self.row(idx)).collect()
    }

    /// First row whose title contains `needle`, ignoring case
    pub fn find_title(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.records
            .iter()
            .position(|r| r[self.title_col].to_lowercase().contains(&needle))
    }

    /// Store a row's BPM and note back into the table
    pub fn update(&mut self, idx: usize, row: &CatalogRow) -> Result<()> {
        let len = self.records.len();
        let record = self.records.get_mut(idx).ok_or_else(|| {
            Error::InvalidInput(format!("row {} out of bounds ({} rows)", idx, len))
        })?;
        record[self.bpm_col] = row.bpm_cell();
        record[self.note_col] = row.bpm_note.clone();
        Ok(())
    }

    /// Write the catalog with a UTF-8 BOM
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.to_writer(&mut out)?;
        out.flush()?;

        tracing::info!(path = %path.display(), rows = self.len(), "Catalog written");
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(BOM.as_bytes())?;

        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&self.headers)?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Index of `name`, appending an empty column if it is missing
fn ensure_column(headers: &mut Vec<String>, records: &mut [Vec<String>], name: &str) -> usize {
    if let Some(col) = column(headers, name) {
        return col;
    }
    headers.push(name.to_string());
    for record in records.iter_mut() {
        record.push(String::new());
    }
    headers.len() - 1
}
