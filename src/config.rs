//! Runtime configuration.
//!
//! Command-line flags resolve into a `Config`; defaults keep the data file in
//! the working directory and the log file in the per-user data directory.

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;

use crate::db::DEFAULT_DATA_FILE;

/// File name of the log inside the per-user data directory.
const LOG_FILE_NAME: &str = "country-registry.log";

/// Terminal record manager for a small dataset of countries.
#[derive(Parser, Debug)]
#[command(name = "country-registry")]
#[command(version)]
pub struct Args {
    /// CSV file holding the registry
    #[arg(short, long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Where to write the log (defaults to the per-user data directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, conflicts_with = "log_file")]
    pub no_log: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Delimited file loaded at startup and rewritten after every change.
    pub data_file: PathBuf,
    /// Destination for tracing output; `None` disables logging.
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        let log_file = if args.no_log {
            None
        } else {
            args.log_file.or_else(default_log_file)
        };

        Self {
            data_file: args.data_file,
            log_file,
        }
    }
}

fn default_log_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "country-registry")
        .map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
}
