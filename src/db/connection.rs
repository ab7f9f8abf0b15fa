use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result};
use crate::models::Country;

/// File name used in the working directory when no path is configured.
pub const DEFAULT_DATA_FILE: &str = "countries.csv";
/// Header row, in the column order every saved file uses.
pub const COLUMNS: [&str; 4] = ["name", "population", "area", "continent"];

/// Row as it appears on disk, before the numeric columns are validated.
#[derive(Debug, Deserialize)]
struct RawRow {
    name: String,
    population: String,
    area: String,
    continent: String,
}

/// A data row the loader refused, with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

/// What happened while loading, for the welcome screen and the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub file_found: bool,
    pub loaded: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Handle on the delimited data file. Loading reads it whole, saving replaces
/// it whole.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed row. A missing file yields an empty collection,
    /// and rows with non-numeric counts are skipped and reported rather than
    /// failing the load.
    pub fn load(&self) -> Result<(Vec<Country>, LoadReport)> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "data file not found, starting empty");
                return Ok((Vec::new(), LoadReport::default()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file));
        let headers = reader.headers()?.clone();

        let mut countries = Vec::new();
        let mut report = LoadReport {
            file_found: true,
            ..LoadReport::default()
        };
        let mut record = StringRecord::new();

        loop {
            match reader.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    let line = record.position().map(|pos| pos.line()).unwrap_or(0);
                    match parse_row(&record, &headers) {
                        Ok(country) => countries.push(country),
                        Err(reason) => report.skipped.push(SkippedRow { line, reason }),
                    }
                }
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    let line = err.position().map(|pos| pos.line()).unwrap_or(0);
                    report.skipped.push(SkippedRow {
                        line,
                        reason: err.to_string(),
                    });
                }
            }
        }

        for skipped in &report.skipped {
            warn!(line = skipped.line, reason = %skipped.reason, "skipped malformed row");
        }
        report.loaded = countries.len();
        info!(
            path = %self.path.display(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "loaded countries"
        );

        Ok((countries, report))
    }

    /// Replace the file with a header row plus one row per record. The rows go
    /// to a sibling temporary file first and are renamed over the target, so a
    /// failed write leaves the previous contents in place.
    pub fn save(&self, countries: &[Country]) -> Result<()> {
        self.replace_contents(countries)
            .map_err(|source| CatalogError::Save {
                path: self.path.clone(),
                source: Box::new(source),
            })?;

        debug!(path = %self.path.display(), rows = countries.len(), "saved countries");
        Ok(())
    }

    fn replace_contents(&self, countries: &[Country]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path();
        let written = write_rows(&tmp_path, countries)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(CatalogError::from));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }
}

fn write_rows(path: &Path, countries: &[Country]) -> Result<()> {
    let file = File::create(path)?;
    {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(&file);
        writer.write_record(COLUMNS)?;
        for country in countries {
            writer.serialize(country)?;
        }
        writer.flush()?;
    }
    file.sync_all()?;
    Ok(())
}

fn parse_row(record: &StringRecord, headers: &StringRecord) -> std::result::Result<Country, String> {
    let raw: RawRow = record
        .deserialize(Some(headers))
        .map_err(|err| err.to_string())?;

    let population = parse_count(&raw.population)
        .ok_or_else(|| format!("population '{}' is not a whole number", raw.population))?;
    let area = parse_count(&raw.area)
        .ok_or_else(|| format!("area '{}' is not a whole number", raw.area))?;

    Ok(Country {
        name: raw.name,
        population,
        area,
        continent: raw.continent,
    })
}

/// Digits only: no sign, no separators, no surrounding spaces.
fn parse_count(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
