//! Generator configuration and the named distribution bounds.
//!
//! Every pseudorandom draw the generator makes is parameterized by one of
//! the `[low, high)` ranges below. They are public constants rather than
//! embedded literals so the synthetic model stays auditable and tunable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CountryProfile;

/// Range the per-country resident population is drawn from.
pub const POPULATION_RANGE: (u64, u64) = (10_000_000, 350_000_000);

/// Range the per-country daily epidemic-size slope is drawn from.
pub const DAILY_GROWTH_RANGE: (u64, u64) = (50, 500);

/// Fraction of the population the epidemic-size baseline is capped at.
pub const EPIDEMIC_POPULATION_CAP: f64 = 0.30;

/// Amplitudes of the three superimposed epidemic waves, as fractions of
/// the baseline. Paired index-wise with [`WAVE_PERIODS_DAYS`].
pub const WAVE_AMPLITUDES: [f64; 3] = [0.30, 0.20, 0.10];

/// Periods (in days) of the three superimposed epidemic waves.
pub const WAVE_PERIODS_DAYS: [f64; 3] = [100.0, 200.0, 300.0];

/// Fraction of `total_cases` drawn daily as `total_deaths`.
pub const DEATH_FRACTION_RANGE: (f64, f64) = (0.01, 0.05);

/// Fraction of `total_cases` drawn daily as `new_cases`.
pub const NEW_CASE_FRACTION_RANGE: (f64, f64) = (0.001, 0.02);

/// Fraction of `new_cases` drawn daily as `new_deaths`.
pub const NEW_DEATH_FRACTION_RANGE: (f64, f64) = (0.01, 0.03);

/// Fraction of `new_cases` drawn daily as `hosp_patients`.
pub const HOSP_FRACTION_RANGE: (f64, f64) = (0.05, 0.15);

/// Fraction of `hosp_patients` drawn daily as `icu_patients`.
///
/// The upper bound is below 1.0, so `icu_patients <= hosp_patients` holds
/// by construction.
pub const ICU_FRACTION_RANGE: (f64, f64) = (0.10, 0.30);

/// Multiple of the population the vaccination campaign reaches after one
/// year at full pace.
pub const VACCINATION_ANNUAL_PACE: f64 = 1.8;

/// Hard cap on cumulative doses, as a multiple of the population.
pub const VACCINATION_POPULATION_CAP: f64 = 2.0;

/// Default seed for the synthetic panel.
pub const DEFAULT_SEED: u64 = 42;

/// First day of the default panel range.
#[must_use]
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

/// Last day of the default panel range (inclusive).
#[must_use]
pub fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default()
}

/// Day the vaccination campaign starts. Vaccination counters are zero on
/// every earlier date.
#[must_use]
pub fn default_campaign_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default()
}

/// Full parameterization of one panel generation run.
///
/// Two runs with equal configurations produce byte-identical panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Ordered country roster. An empty roster yields an empty panel.
    pub countries: Vec<CountryProfile>,
    /// First day of the panel (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the panel (inclusive).
    pub end_date: NaiveDate,
    /// Day the vaccination campaign starts.
    pub campaign_start: NaiveDate,
    /// Seed fixing all pseudorandom draws.
    pub seed: u64,
}

impl GeneratorConfig {
    /// Creates a configuration over `[start_date, end_date]` with the
    /// default campaign start.
    #[must_use]
    pub fn new(
        countries: Vec<CountryProfile>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        seed: u64,
    ) -> Self {
        Self {
            countries,
            start_date,
            end_date,
            campaign_start: default_campaign_start(),
            seed,
        }
    }

    /// Number of days in the inclusive date range.
    #[must_use]
    pub fn num_days(&self) -> u64 {
        u64::try_from((self.end_date - self.start_date).num_days() + 1).unwrap_or(0)
    }

    /// Fails fast on configurations that are programmer errors rather than
    /// runtime conditions: a start date after the end date, a duplicated
    /// country name, or a zero population.
    ///
    /// An empty roster is deliberately *not* an error here; it produces an
    /// empty panel and the downstream filter's fallback handles the
    /// user-facing case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        let mut seen = std::collections::BTreeSet::new();
        for profile in &self.countries {
            if profile.population == 0 {
                return Err(ConfigError::InvalidPopulation {
                    country: profile.name.clone(),
                });
            }
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::DuplicateCountry {
                    country: profile.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Error returned by [`GeneratorConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The start date is after the end date.
    InvalidDateRange {
        /// Configured start of the range.
        start: NaiveDate,
        /// Configured end of the range.
        end: NaiveDate,
    },
    /// A roster entry carries a zero population.
    InvalidPopulation {
        /// Offending country name.
        country: String,
    },
    /// The same country name appears twice in the roster.
    DuplicateCountry {
        /// Duplicated country name.
        country: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDateRange { start, end } => {
                write!(f, "start date {start} is after end date {end}")
            }
            Self::InvalidPopulation { country } => {
                write!(f, "country '{country}' has zero population")
            }
            Self::DuplicateCountry { country } => {
                write!(f, "country '{country}' appears twice in the roster")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
