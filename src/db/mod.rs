//! Persistence module split across logical submodules.

mod connection;
mod countries;

pub use connection::{DataFile, LoadReport, SkippedRow, COLUMNS, DEFAULT_DATA_FILE};
pub use countries::{apply_update, insert_country, CountryPatch, CountryStore};
