//! Title normalization and canonical lookup keys
//!
//! Catalog titles and audio filenames rarely agree character for character:
//! accents, punctuation, track numbers and parenthetical credits differ
//! between the two. Both sides are reduced to a [`CanonicalKey`] made only of
//! `[a-z0-9]` so they can meet in a hash lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Any parenthetical group: "(Orch. Di Sarli)", "(1941)"
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Leading track number plus one separator: "01 ", "03 - ", "7_", "12."
static TRACK_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s*[-_. ]\s*").unwrap());

/// Variant separator inside catalog titles
const VARIANT_SEPARATOR: &str = " -";

/// Normalized lookup key: lowercase ASCII letters and digits only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reduce text to its canonical key
///
/// Lowercases, decomposes accented letters (NFD) and keeps only `[a-z0-9]`,
/// so "Canción Desesperada" and "cancion-desesperada" meet at
/// `canciondesesperada`. Never fails; text with no ASCII letters or digits
/// yields an empty key.
pub fn normalize(text: &str) -> CanonicalKey {
    let key = text
        .to_lowercase()
        .nfd()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    CanonicalKey(key)
}

/// Simplified forms of a catalog title, in derivation order
///
/// 1. the trimmed title
/// 2. parenthetical groups removed
/// 3. cut at the first " -"
/// 4. both (2) and (3)
///
/// Duplicate and empty titles are dropped before keying.
pub fn title_variants(title: &str) -> Vec<String> {
    let t0 = title.trim();
    let t1 = PARENTHETICAL.replace_all(t0, "");
    let t1 = t1.trim();
    let t2 = before_separator(t0);
    let t3 = before_separator(t1);

    let mut variants: Vec<String> = Vec::with_capacity(4);
    for candidate in [t0, t1, t2, t3] {
        if !candidate.is_empty() && !variants.iter().any(|v| v == candidate) {
            variants.push(candidate.to_string());
        }
    }
    variants
}

/// Canonical keys for every title variant, first occurrence wins
///
/// Empty keys are skipped: they would collide with every filename that
/// normalizes to nothing (e.g. titles written entirely in Hangul).
pub fn variants(title: &str) -> Vec<CanonicalKey> {
    let mut keys: Vec<CanonicalKey> = Vec::with_capacity(4);
    for variant in title_variants(title) {
        let key = normalize(&variant);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Remove a leading track number: "01 La Cumparsita" → "La Cumparsita"
pub fn strip_track_number(stem: &str) -> String {
    TRACK_NUMBER_PREFIX.replace(stem, "").trim().to_string()
}

/// Text before the first dash-like character (-, – or —), trimmed
pub fn base_title(stem: &str) -> String {
    stem.split(['-', '\u{2013}', '\u{2014}'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn before_separator(text: &str) -> &str {
    text.split(VARIANT_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
}
