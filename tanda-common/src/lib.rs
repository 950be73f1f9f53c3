//! # Tanda Common Library
//!
//! Shared code for the tanda tools:
//! - Error and result types
//! - Bootstrap configuration (TOML file, environment, compiled defaults)

pub mod config;
pub mod error;

pub use error::{Error, Result};
