//! Read-only views over the record store: exact lookup, substring search,
//! continent and range filters, and ordering. Every function borrows the
//! records and hands back references, so the caller decides whether a view
//! needs to outlive the store borrow.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{CatalogError, Result};
use crate::models::{normalize, Country};

/// Numeric column a range filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Population,
    Area,
}

impl RangeField {
    pub fn value(self, country: &Country) -> u64 {
        match self {
            RangeField::Population => country.population,
            RangeField::Area => country.area,
        }
    }
}

impl fmt::Display for RangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeField::Population => write!(f, "population"),
            RangeField::Area => write!(f, "area"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Population,
    Area,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Name => write!(f, "name"),
            SortKey::Population => write!(f, "population"),
            SortKey::Area => write!(f, "area"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ascending"),
            SortDirection::Descending => write!(f, "descending"),
        }
    }
}

/// Position of the first record whose normalized name equals the normalized
/// query.
pub fn find_exact(records: &[Country], name: &str) -> Option<usize> {
    let wanted = normalize(name);
    records
        .iter()
        .position(|country| country.normalized_name() == wanted)
}

/// Records whose normalized name contains the normalized term. An empty term
/// matches everything.
pub fn search_substring<'a>(records: &'a [Country], term: &str) -> Vec<&'a Country> {
    let needle = normalize(term);
    records
        .iter()
        .filter(|country| country.normalized_name().contains(&needle))
        .collect()
}

pub fn filter_by_continent<'a>(records: &'a [Country], continent: &str) -> Vec<&'a Country> {
    let wanted = normalize(continent);
    records
        .iter()
        .filter(|country| normalize(&country.continent) == wanted)
        .collect()
}

/// Inclusive range filter. A reversed range is an error, not an empty view.
pub fn filter_by_range(
    records: &[Country],
    field: RangeField,
    min: u64,
    max: u64,
) -> Result<Vec<&Country>> {
    if min > max {
        return Err(CatalogError::InvalidRange { field, min, max });
    }

    Ok(records
        .iter()
        .filter(|country| (min..=max).contains(&field.value(country)))
        .collect())
}

/// Ordered view of the records. The sort is stable in both directions, so
/// records that tie on the key keep their store order.
pub fn sort(records: &[Country], key: SortKey, direction: SortDirection) -> Vec<&Country> {
    match key {
        SortKey::Name => {
            let mut keyed: Vec<(String, &Country)> = records
                .iter()
                .map(|country| (country.normalized_name(), country))
                .collect();
            keyed.sort_by(|a, b| direction.apply(a.0.cmp(&b.0)));
            keyed.into_iter().map(|(_, country)| country).collect()
        }
        SortKey::Population | SortKey::Area => {
            let field = if key == SortKey::Population {
                RangeField::Population
            } else {
                RangeField::Area
            };
            let mut view: Vec<&Country> = records.iter().collect();
            view.sort_by(|a, b| direction.apply(field.value(a).cmp(&field.value(b))));
            view
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Country> {
        vec![
            Country::new("Chile", 19_000_000, 756_102, "America"),
            Country::new("South  Korea", 51_000_000, 100_210, "Asia"),
            Country::new("Argentina", 46_000_000, 2_780_400, "America"),
            Country::new("Uruguay", 3_400_000, 176_215, " america "),
        ]
    }

    fn names(view: &[&Country]) -> Vec<String> {
        view.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn find_exact_ignores_case_and_spacing() {
        let records = sample();
        assert_eq!(find_exact(&records, "  ChilE"), Some(0));
        assert_eq!(find_exact(&records, "south korea"), Some(1));
        assert_eq!(find_exact(&records, "chi"), None);
    }

    #[test]
    fn find_exact_returns_first_duplicate() {
        let mut records = sample();
        records.push(Country::new("CHILE", 1, 1, "America"));
        assert_eq!(find_exact(&records, "chile"), Some(0));
    }

    #[test]
    fn substring_search_matches_inside_names() {
        let records = sample();
        assert_eq!(names(&search_substring(&records, "GU")), vec!["Uruguay"]);
        assert_eq!(
            names(&search_substring(&records, "a")),
            vec!["South  Korea", "Argentina", "Uruguay"]
        );
        assert_eq!(search_substring(&records, "h k").len(), 1);
    }

    #[test]
    fn empty_search_term_matches_everything() {
        let records = sample();
        assert_eq!(search_substring(&records, "").len(), records.len());
        assert_eq!(search_substring(&records, "   ").len(), records.len());
    }

    #[test]
    fn continent_filter_is_normalized_equality() {
        let records = sample();
        assert_eq!(
            names(&filter_by_continent(&records, "AMERICA")),
            vec!["Chile", "Argentina", "Uruguay"]
        );
        assert!(filter_by_continent(&records, "Amer").is_empty());
    }

    #[test]
    fn range_filter_is_inclusive() {
        let records = sample();
        let view = filter_by_range(&records, RangeField::Area, 176_215, 756_102).unwrap();
        assert_eq!(names(&view), vec!["Chile", "Uruguay"]);
        let view = filter_by_range(&records, RangeField::Population, 0, 0).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let records = sample();
        let err = filter_by_range(&records, RangeField::Population, 100, 50).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidRange {
                field: RangeField::Population,
                min: 100,
                max: 50
            }
        ));
        assert_eq!(records, sample());
    }

    #[test]
    fn sort_by_name_uses_normalized_names() {
        let records = vec![
            Country::new("peru", 1, 1, "America"),
            Country::new("Bolivia", 2, 2, "America"),
            Country::new("  angola", 3, 3, "Africa"),
        ];
        let view = sort(&records, SortKey::Name, SortDirection::Ascending);
        assert_eq!(names(&view), vec!["  angola", "Bolivia", "peru"]);
        let view = sort(&records, SortKey::Name, SortDirection::Descending);
        assert_eq!(names(&view), vec!["peru", "Bolivia", "  angola"]);
    }

    #[test]
    fn sort_keeps_store_order_for_ties() {
        let records = vec![
            Country::new("A", 5, 1, "X"),
            Country::new("B", 1, 1, "X"),
            Country::new("C", 5, 1, "X"),
        ];
        let view = sort(&records, SortKey::Population, SortDirection::Descending);
        assert_eq!(names(&view), vec!["A", "C", "B"]);
        let view = sort(&records, SortKey::Area, SortDirection::Ascending);
        assert_eq!(names(&view), vec!["A", "B", "C"]);
    }

    #[test]
    fn sort_does_not_touch_the_store() {
        let records = sample();
        let _ = sort(&records, SortKey::Area, SortDirection::Descending);
        assert_eq!(records, sample());
    }
}
