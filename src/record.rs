use std::fmt;

use crate::error::{CatalogError, Result};

/// Longest accepted district or town name, in bytes.
pub const MAX_NAME_LEN: usize = 49;
/// Longest accepted municipality flag, in bytes.
pub const MAX_FLAG_LEN: usize = 3;

/// One municipal record. `town` is the catalog key.
///
/// `municipality` is kept exactly as given (`"yes"`, `"no"`, `"No"`, ...) since the municipality
/// filter compares it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Town {
    pub district: String,
    pub town: String,
    pub population: u32,
    pub elevation: i32,
    pub municipality: String,
}

impl Town {
    pub fn new(
        district: impl Into<String>,
        town: impl Into<String>,
        population: u32,
        elevation: i32,
        municipality: impl Into<String>,
    ) -> Self {
        Self {
            district: district.into(),
            town: town.into(),
            population,
            elevation,
            municipality: municipality.into(),
        }
    }

    /// Check that every text field is present, fits its limit and can be written as one line.
    pub fn validate(&self) -> Result<()> {
        check_field("district", &self.district, MAX_NAME_LEN)?;
        check_field("town", &self.town, MAX_NAME_LEN)?;
        check_field("municipality", &self.municipality, MAX_FLAG_LEN)
    }

    /// Overwrite the non-key fields with `update`.
    pub fn apply(&mut self, update: TownUpdate) {
        self.population = update.population;
        self.elevation = update.elevation;
        self.municipality = update.municipality;
    }
}

impl fmt::Display for Town {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Town: {}, District: {}, Population: {}, Elevation: {}, Municipality: {}",
            self.town, self.district, self.population, self.elevation, self.municipality
        )
    }
}

/// Replacement values for the mutable fields of a [`Town`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownUpdate {
    pub population: u32,
    pub elevation: i32,
    pub municipality: String,
}

impl TownUpdate {
    pub fn validate(&self) -> Result<()> {
        check_field("municipality", &self.municipality, MAX_FLAG_LEN)
    }
}

impl From<&Town> for TownUpdate {
    fn from(town: &Town) -> Self {
        Self {
            population: town.population,
            elevation: town.elevation,
            municipality: town.municipality.clone(),
        }
    }
}

// The line format has no escaping, so the separator and line breaks can never round-trip.
fn check_field(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(CatalogError::MissingField { field });
    }
    if value.len() > max {
        return Err(CatalogError::FieldTooLong { field, max });
    }
    if value.contains(|c: char| matches!(c, ':' | '\n' | '\r')) {
        return Err(CatalogError::InvalidField { field });
    }
    Ok(())
}
