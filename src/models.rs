//! Domain model shared by persistence, the query/statistics engines, and the
//! TUI. `Country` stays a plain data holder so the other layers can focus on
//! storage and presentation. Name comparisons everywhere go through
//! [`normalize`], which is why it lives next to the type it applies to.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One row of the registry. Field order matches the column order of the data
/// file, which `csv` relies on when it writes the header.
pub struct Country {
    /// Display name, stored exactly as typed. Uniqueness is checked on the
    /// normalized form.
    pub name: String,
    /// Number of inhabitants.
    pub population: u64,
    /// Surface in km².
    pub area: u64,
    /// Free-text continent label, stored as typed but filtered normalized.
    pub continent: String,
}

impl Country {
    pub fn new(
        name: impl Into<String>,
        population: u64,
        area: u64,
        continent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            population,
            area,
            continent: continent.into(),
        }
    }

    /// Normalized name used for lookups and name ordering.
    pub fn normalized_name(&self) -> String {
        normalize(&self.name)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Collapse whitespace runs into single spaces, trim both ends, and lowercase.
/// `"  South   KOREA "` and `"south korea"` normalize to the same key.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
