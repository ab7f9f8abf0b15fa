//! Error types for the registry.
//!
//! The engines and the persistence layer speak `CatalogError`; the terminal
//! layer wraps it in `anyhow` the same way it wraps crossterm failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::query::RangeField;

/// Result type alias using CatalogError
pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    InvalidInput(String),

    #[error("Minimum {field} ({min}) cannot be greater than the maximum ({max}).")]
    InvalidRange { field: RangeField, min: u64, max: u64 },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Country '{0}' already exists.")]
    DuplicateName(String),

    #[error("Country '{0}' does not exist.")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Box<CatalogError>,
    },
}
