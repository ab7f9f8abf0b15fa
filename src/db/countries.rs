use std::path::Path;

use tracing::info;

use crate::error::{CatalogError, Result};
use crate::models::Country;
use crate::query::find_exact;

use super::connection::{DataFile, LoadReport};

/// Fields an update may change. Name and continent are fixed once created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountryPatch {
    pub population: Option<u64>,
    pub area: Option<u64>,
}

/// Append a record unless its normalized name is already taken. Returns the
/// index of the new record.
pub fn insert_country(records: &mut Vec<Country>, country: Country) -> Result<usize> {
    if find_exact(records, &country.name).is_some() {
        return Err(CatalogError::DuplicateName(country.name));
    }
    records.push(country);
    Ok(records.len() - 1)
}

/// Apply only the supplied fields to the record matching `name`.
pub fn apply_update(records: &mut [Country], name: &str, patch: CountryPatch) -> Result<usize> {
    let index = find_exact(records, name).ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
    let country = &mut records[index];
    if let Some(population) = patch.population {
        country.population = population;
    }
    if let Some(area) = patch.area {
        country.area = area;
    }
    Ok(index)
}

/// The in-memory record store plus the file it is flushed to. Mutations run
/// against a copy and only replace the store once the file write succeeded, so
/// memory and disk never disagree after an error.
#[derive(Debug)]
pub struct CountryStore {
    countries: Vec<Country>,
    file: DataFile,
}

impl CountryStore {
    pub fn new(file: DataFile, countries: Vec<Country>) -> Self {
        Self { countries, file }
    }

    /// Load the store from `file`.
    pub fn open(file: DataFile) -> Result<(Self, LoadReport)> {
        let (countries, report) = file.load()?;
        Ok((Self::new(file, countries), report))
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn add(&mut self, country: Country) -> Result<&Country> {
        let mut next = self.countries.clone();
        let index = insert_country(&mut next, country)?;
        self.file.save(&next)?;
        self.countries = next;

        let added = &self.countries[index];
        info!(name = %added.name, continent = %added.continent, "added country");
        Ok(added)
    }

    pub fn update(&mut self, name: &str, patch: CountryPatch) -> Result<&Country> {
        let mut next = self.countries.clone();
        let index = apply_update(&mut next, name, patch)?;
        self.file.save(&next)?;
        self.countries = next;

        let updated = &self.countries[index];
        info!(
            name = %updated.name,
            population = updated.population,
            area = updated.area,
            "updated country"
        );
        Ok(updated)
    }
}
