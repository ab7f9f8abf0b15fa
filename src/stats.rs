//! Aggregate figures over the record store.

use std::collections::HashMap;

use crate::models::Country;

/// Truncating means of the numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Averages {
    pub population: u64,
    pub area: u64,
}

/// Everything the statistics screen shows, computed in one pass per figure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub most_populated: Country,
    pub least_populated: Country,
    pub averages: Averages,
    pub by_continent: Vec<(String, usize)>,
    pub total: usize,
}

impl Summary {
    /// `None` when there is nothing to summarize.
    pub fn compute(records: &[Country]) -> Option<Self> {
        let (most, least) = extremes_by_population(records)?;
        let averages = averages(records)?;
        Some(Self {
            most_populated: most.clone(),
            least_populated: least.clone(),
            averages,
            by_continent: counts_by_continent(records),
            total: records.len(),
        })
    }
}

/// `(max, min)` by population. The incumbent is only replaced when strictly
/// surpassed, so the first record wins ties.
pub fn extremes_by_population(records: &[Country]) -> Option<(&Country, &Country)> {
    let first = records.first()?;
    let mut max = first;
    let mut min = first;
    for country in records {
        if country.population > max.population {
            max = country;
        }
        if country.population < min.population {
            min = country;
        }
    }
    Some((max, min))
}

pub fn averages(records: &[Country]) -> Option<Averages> {
    if records.is_empty() {
        return None;
    }

    // Sums are widened so large datasets cannot overflow before dividing.
    let count = records.len() as u128;
    let population: u128 = records.iter().map(|c| u128::from(c.population)).sum();
    let area: u128 = records.iter().map(|c| u128::from(c.area)).sum();

    // A mean never exceeds the largest value, so narrowing back is lossless.
    Some(Averages {
        population: (population / count) as u64,
        area: (area / count) as u64,
    })
}

/// Record count per continent, grouped on the exact stored string and sorted
/// alphabetically.
pub fn counts_by_continent(records: &[Country]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for country in records {
        *counts.entry(country.continent.as_str()).or_insert(0) += 1;
    }

    let mut grouped: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(continent, count)| (continent.to_string(), count))
        .collect();
    grouped.sort_by(|a, b| a.0.cmp(&b.0));
    grouped
}
