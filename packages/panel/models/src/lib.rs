#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Country roster and daily record types for the synthetic COVID-19 panel.
//!
//! This crate defines the canonical row types shared across the epi-dash
//! system: static per-country attributes ([`CountryProfile`]), one row per
//! (country, date) pair ([`DailyRecord`]), and the generator configuration
//! with its named distribution bounds ([`config`]).

pub mod config;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Continent a country belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Continent {
    /// Africa
    Africa,
    /// Asia
    Asia,
    /// Europe
    Europe,
    /// North America
    NorthAmerica,
    /// Oceania
    Oceania,
    /// South America
    SouthAmerica,
}

impl Continent {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Africa,
            Self::Asia,
            Self::Europe,
            Self::NorthAmerica,
            Self::Oceania,
            Self::SouthAmerica,
        ]
    }
}

/// Static per-country attributes.
///
/// Immutable once constructed. `name` is the unique key used to join
/// [`DailyRecord`] rows back to their country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryProfile {
    /// Human-readable country name (unique key).
    pub name: String,
    /// ISO 3166-1 alpha-3 code (e.g. "USA", "KEN").
    pub iso_code: String,
    /// Continent the country belongs to.
    pub continent: Continent,
    /// Resident population. Always positive.
    pub population: u64,
}

impl CountryProfile {
    /// Creates a profile, rejecting a zero population.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRecordError`] if `population` is zero.
    pub fn new(
        name: impl Into<String>,
        iso_code: impl Into<String>,
        continent: Continent,
        population: u64,
    ) -> Result<Self, InvalidRecordError> {
        if population == 0 {
            return Err(InvalidRecordError {
                field: "population",
                message: "population must be positive".to_string(),
            });
        }
        Ok(Self {
            name: name.into(),
            iso_code: iso_code.into(),
            continent,
            population,
        })
    }
}

/// One row of the synthetic panel: raw epidemiological counters for a
/// single (country, date) pair.
///
/// Cumulative counters (`total_cases`, `total_deaths`, `total_vaccinations`)
/// carry the running totals as of `date`; `new_cases`/`new_deaths` are the
/// daily deltas. Country attributes are denormalized onto every row so a
/// filtered slice of the panel is self-describing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    /// Country name (foreign key to [`CountryProfile::name`]).
    pub country: String,
    /// ISO 3166-1 alpha-3 code.
    pub iso_code: String,
    /// Continent.
    pub continent: Continent,
    /// Calendar date of this row (no time component).
    pub date: NaiveDate,
    /// Cumulative confirmed cases.
    pub total_cases: u64,
    /// Cases newly reported on this date.
    pub new_cases: u64,
    /// Cumulative deaths.
    pub total_deaths: u64,
    /// Deaths newly reported on this date.
    pub new_deaths: u64,
    /// Patients currently hospitalized.
    pub hosp_patients: u64,
    /// Patients currently in intensive care.
    pub icu_patients: u64,
    /// Cumulative vaccine doses administered.
    pub total_vaccinations: u64,
    /// People having received at least one dose.
    pub people_vaccinated: u64,
    /// People having completed the initial protocol.
    pub people_fully_vaccinated: u64,
    /// Country population (constant across a country's rows).
    pub population: u64,
}

impl DailyRecord {
    /// Checks the cross-field invariants that hold for every panel row.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRecordError`] naming the offending field when:
    /// `population` is zero, `people_fully_vaccinated` exceeds
    /// `total_vaccinations`, `people_vaccinated` exceeds `population`, or
    /// `icu_patients` exceeds `hosp_patients`.
    pub fn validate(&self) -> Result<(), InvalidRecordError> {
        if self.population == 0 {
            return Err(InvalidRecordError {
                field: "population",
                message: format!("population must be positive for {}", self.country),
            });
        }
        if self.people_fully_vaccinated > self.total_vaccinations {
            return Err(InvalidRecordError {
                field: "people_fully_vaccinated",
                message: format!(
                    "{} fully vaccinated exceeds {} total vaccinations",
                    self.people_fully_vaccinated, self.total_vaccinations
                ),
            });
        }
        if self.people_vaccinated > self.population {
            return Err(InvalidRecordError {
                field: "people_vaccinated",
                message: format!(
                    "{} vaccinated exceeds population {}",
                    self.people_vaccinated, self.population
                ),
            });
        }
        if self.icu_patients > self.hosp_patients {
            return Err(InvalidRecordError {
                field: "icu_patients",
                message: format!(
                    "{} ICU patients exceed {} hospital patients",
                    self.icu_patients, self.hosp_patients
                ),
            });
        }
        Ok(())
    }
}

/// Error returned when a record or profile violates a construction invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecordError {
    /// Name of the field that failed validation.
    pub field: &'static str,
    /// Description of the violation.
    pub message: String,
}

impl std::fmt::Display for InvalidRecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.message)
    }
}

impl std::error::Error for InvalidRecordError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DailyRecord {
        DailyRecord {
            country: "Kenya".to_string(),
            iso_code: "KEN".to_string(),
            continent: Continent::Africa,
            date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            total_cases: 1000,
            new_cases: 20,
            total_deaths: 30,
            new_deaths: 1,
            hosp_patients: 5,
            icu_patients: 2,
            total_vaccinations: 500,
            people_vaccinated: 500,
            people_fully_vaccinated: 0,
            population: 50_000_000,
        }
    }

    #[test]
    fn valid_record_passes() {
        assert!(record().validate().is_ok());
    }

    #[test]
    fn rejects_zero_population() {
        let mut rec = record();
        rec.population = 0;
        assert_eq!(rec.validate().unwrap_err().field, "population");
    }

    #[test]
    fn rejects_fully_vaccinated_above_total() {
        let mut rec = record();
        rec.people_fully_vaccinated = rec.total_vaccinations + 1;
        assert_eq!(
            rec.validate().unwrap_err().field,
            "people_fully_vaccinated"
        );
    }

    #[test]
    fn rejects_vaccinated_above_population() {
        let mut rec = record();
        rec.people_vaccinated = rec.population + 1;
        assert_eq!(rec.validate().unwrap_err().field, "people_vaccinated");
    }

    #[test]
    fn rejects_icu_above_hospitalized() {
        let mut rec = record();
        rec.icu_patients = rec.hosp_patients + 1;
        assert_eq!(rec.validate().unwrap_err().field, "icu_patients");
    }

    #[test]
    fn profile_rejects_zero_population() {
        assert!(CountryProfile::new("Kenya", "KEN", Continent::Africa, 0).is_err());
    }

    #[test]
    fn continent_string_roundtrip() {
        for continent in Continent::all() {
            let s = continent.to_string();
            assert_eq!(s.parse::<Continent>().unwrap(), *continent);
        }
        assert_eq!(Continent::NorthAmerica.to_string(), "NORTH_AMERICA");
    }
}
