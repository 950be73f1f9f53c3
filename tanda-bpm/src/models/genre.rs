//! Dance genres and their expected tempo ranges
//!
//! The catalog's genre column is free text ("Tango", "Vals criollo",
//! "Milonga candombe", empty). It is reduced to one of three dance genres,
//! each with the BPM interval a DJ expects for it.

use std::fmt;

/// Inclusive BPM interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreRange {
    pub low: f64,
    pub high: f64,
}

impl GenreRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.low && bpm <= self.high
    }
}

impl fmt::Display for GenreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.low, self.high)
    }
}

/// Static genre → range table (`waltz` is an alias of `vals`)
pub const GENRE_RANGES: [(&str, GenreRange); 4] = [
    ("tango", GenreRange::new(55.0, 95.0)),
    ("vals", GenreRange::new(55.0, 95.0)),
    ("waltz", GenreRange::new(55.0, 95.0)),
    ("milonga", GenreRange::new(85.0, 130.0)),
];

/// Look up a normalized genre identifier
pub fn genre_range(key: &str) -> Option<GenreRange> {
    GENRE_RANGES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, range)| *range)
}

/// Normalized dance genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Tango,
    Vals,
    Milonga,
}

impl Genre {
    /// Table identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Tango => "tango",
            Genre::Vals => "vals",
            Genre::Milonga => "milonga",
        }
    }

    /// Expected tempo range
    pub fn range(&self) -> GenreRange {
        // Every variant has a table row
        genre_range(self.as_str()).unwrap_or(GENRE_RANGES[0].1)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce free-text genre to a dance genre
///
/// Empty or unrecognized text is tango. "milonga" anywhere wins over the
/// waltz spellings, so "Milonga / Vals" is a milonga.
pub fn normalize_genre(raw: &str) -> Genre {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() {
        return Genre::Tango;
    }
    if raw.contains("milonga") {
        return Genre::Milonga;
    }
    if ["vals", "valse", "waltz"].iter().any(|k| raw.contains(k)) {
        return Genre::Vals;
    }
    Genre::Tango
}
