//! Data models: dance genres, the CSV catalog and the failure log

pub mod catalog;
pub mod failure_log;
pub mod genre;

pub use catalog::{Catalog, CatalogRow};
pub use failure_log::{FailureEntry, FailureLog};
pub use genre::{genre_range, normalize_genre, Genre, GenreRange};
