//! Catalog title → audio file resolution
//!
//! Exact lookup of every title variant first; only when none hits, a fuzzy
//! pass scores the title's canonical key against every key in the index and
//! accepts the best one at or above [`FUZZY_THRESHOLD`].

use crate::normalize::{normalize, variants, CanonicalKey};
use crate::services::file_index::FileIndex;
use std::path::{Path, PathBuf};

/// Minimum similarity (0–100) for a fuzzy match to be accepted
pub const FUZZY_THRESHOLD: f64 = 85.0;

/// Outcome of resolving one title
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// A title variant's key is in the index
    Exact { key: CanonicalKey, path: PathBuf },
    /// Closest index key scored at or above the threshold
    Fuzzy {
        key: CanonicalKey,
        path: PathBuf,
        score: f64,
    },
    /// No exact key and no sufficiently similar key
    NotFound,
}

impl MatchResult {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MatchResult::Exact { path, .. } | MatchResult::Fuzzy { path, .. } => Some(path.as_path()),
            MatchResult::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, MatchResult::NotFound)
    }
}

/// Similarity of two keys on a 0–100 scale
///
/// Levenshtein distance normalized by the longer key's length. Computed from
/// integer counts so boundary scores such as 85 come out exact.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let distance = strsim::levenshtein(a, b).min(max_len);
    ((max_len - distance) * 100) as f64 / max_len as f64
}

/// Whether a fuzzy score is good enough to accept
pub fn accepts(score: f64) -> bool {
    score >= FUZZY_THRESHOLD
}

/// Highest-scoring index key for `query`
///
/// Keys are visited in sorted order and only a strictly better score
/// replaces the current best, so ties keep the first key.
pub fn best_fuzzy_key<'a>(query: &str, index: &'a FileIndex) -> Option<(&'a CanonicalKey, f64)> {
    let mut best: Option<(&CanonicalKey, f64)> = None;
    for key in index.keys() {
        let score = similarity(query, key.as_str());
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((key, score)),
        }
    }
    best
}

/// Resolve a catalog title to an indexed audio file
pub fn match_title(title: &str, index: &FileIndex) -> MatchResult {
    for key in variants(title) {
        if let Some(path) = index.get(&key) {
            tracing::debug!(title = %title, key = %key, "Exact match");
            return MatchResult::Exact {
                path: path.to_path_buf(),
                key,
            };
        }
    }

    let query = normalize(title);
    if query.is_empty() {
        tracing::debug!(title = %title, "Title has no matchable characters");
        return MatchResult::NotFound;
    }

    match best_fuzzy_key(query.as_str(), index) {
        Some((key, score)) if accepts(score) => {
            tracing::debug!(title = %title, key = %key, score = score, "Fuzzy match");
            let path = index.get(key).map(Path::to_path_buf).unwrap_or_default();
            MatchResult::Fuzzy {
                key: key.clone(),
                path,
                score,
            }
        }
        Some((key, score)) => {
            tracing::debug!(
                title = %title,
                closest = %key,
                score = score,
                "No match above fuzzy threshold"
            );
            MatchResult::NotFound
        }
        None => MatchResult::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(names: &[&str]) -> FileIndex {
        FileIndex::from_files(
            Path::new("/music"),
            names.iter().map(|n| PathBuf::from(format!("/music/{}", n))),
        )
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("poema", "poema"), 100.0);
        assert_eq!(similarity("", ""), 100.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
    }

    #[test]
    fn test_similarity_exact_boundary_values() {
        // 20 characters, 3 substitutions → 85
        let a = "abcdefghijklmnopqrst";
        let b = "abcdefghijklmnopqXYZ";
        assert_eq!(similarity(a, b), 85.0);

        // 25 characters, 4 substitutions → 84
        let a = "abcdefghijklmnopqrstuvwxy";
        let b = "abcdefghijklmnopqrstuWXYZ";
        assert_eq!(similarity(a, b), 84.0);
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(accepts(85.0));
        assert!(accepts(100.0));
        assert!(!accepts(84.0));
        assert!(!accepts(84.99));
    }

    #[test]
    fn test_exact_match_on_variant() {
        let index = index_of(&["01 La Cumparsita.mp3"]);
        let result = match_title("La Cumparsita (Orch. Di Sarli)", &index);

        assert_eq!(
            result,
            MatchResult::Exact {
                key: normalize("lacumparsita"),
                path: PathBuf::from("/music/01 La Cumparsita.mp3"),
            }
        );
    }

    #[test]
    fn test_exact_match_takes_first_variant() {
        // Both the full title and the stripped title are indexed; the full one wins
        let index = index_of(&["Poema (Canaro).mp3", "Poema.mp3"]);
        let result = match_title("Poema (Canaro)", &index);

        assert_eq!(result.path(), Some(Path::new("/music/Poema (Canaro).mp3")));
        assert!(matches!(result, MatchResult::Exact { .. }));
    }

    #[test]
    fn test_exact_precedes_closer_fuzzy_candidate() {
        // The raw key "poemaremaster" is one edit from "poemaremaste", but the
        // stripped variant "poema" is an exact hit and wins
        let index = index_of(&["Poema.mp3", "Poema Remaste.mp3"]);
        let result = match_title("Poema (Remaster)", &index);

        assert_eq!(result.path(), Some(Path::new("/music/Poema.mp3")));
        assert!(matches!(result, MatchResult::Exact { .. }));
    }

    #[test]
    fn test_fuzzy_match_accepted() {
        let index = index_of(&["Canaro/Milonga Sentimental.mp3"]);
        // one letter off in 18 characters → ~94.4
        let result = match_title("Milonga Sentimentai", &index);

        match result {
            MatchResult::Fuzzy { path, score, .. } => {
                assert_eq!(path, PathBuf::from("/music/Canaro/Milonga Sentimental.mp3"));
                assert!(score >= FUZZY_THRESHOLD);
            }
            other => panic!("expected fuzzy match, got {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_match_rejected_below_threshold() {
        let index = index_of(&["Poema.mp3"]);
        assert_eq!(match_title("Pavadita", &index), MatchResult::NotFound);
    }

    #[test]
    fn test_fuzzy_tie_keeps_first_key() {
        let index = index_of(&["abcdefghijklmnopqrsu.mp3", "abcdefghijklmnopqrsv.mp3"]);
        let (key, score) = best_fuzzy_key("abcdefghijklmnopqrst", &index).unwrap();

        assert_eq!(key.as_str(), "abcdefghijklmnopqrsu");
        assert_eq!(score, 95.0);
    }

    #[test]
    fn test_empty_index_and_unmatchable_title() {
        let empty = index_of(&[]);
        assert_eq!(match_title("Poema", &empty), MatchResult::NotFound);

        let index = index_of(&["Poema.mp3"]);
        assert_eq!(match_title("라 쿰파르시타", &index), MatchResult::NotFound);
    }
}
