//! Binary entry point: parse flags, set up logging, load the data file, and
//! drive the Ratatui event loop until the user picks "Exit".
use anyhow::Context;
use clap::Parser;
use country_registry::{logging, run_app, App, Args, Config, CountryStore, DataFile};

fn main() -> anyhow::Result<()> {
    let config = Config::from_args(Args::parse());

    if let Some(log_file) = &config.log_file {
        // Logging is best effort; the registry works without it.
        if let Err(err) = logging::init(log_file) {
            eprintln!("warning: logging disabled: {err:#}");
        }
    }

    let data = DataFile::new(&config.data_file);
    let (store, load) = CountryStore::open(data)
        .with_context(|| format!("failed to load {}", config.data_file.display()))?;
    tracing::info!(
        path = %config.data_file.display(),
        countries = store.len(),
        "country registry started"
    );

    let mut app = App::new(store, &load);
    run_app(&mut app)?;

    println!("Thank you for using the Country Registry!");
    Ok(())
}
