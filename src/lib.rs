//! Core library surface for the Country Registry TUI application.
//!
//! The `bin` target wires these pieces together; the integration tests use the
//! same surface to exercise persistence, queries, and statistics without a
//! terminal.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod stats;
pub mod ui;

/// Persistence layer: the data file handle and the record store on top of it.
pub use db::{CountryPatch, CountryStore, DataFile, LoadReport};

pub use config::{Args, Config};
pub use error::{CatalogError, Result};
pub use models::{normalize, Country};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
