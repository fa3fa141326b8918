#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Deterministic synthetic COVID-19 panel generator.
//!
//! Produces one [`DailyRecord`] per (country, date) pair over an inclusive
//! date range. The epidemic-size baseline grows linearly per country (capped
//! at a fraction of the population) with three superimposed sinusoidal waves;
//! daily counters are drawn as uniform fractions of the case counts, and a
//! linear vaccination rollout starts at the configured campaign date.
//!
//! Every draw comes from a per-country sub-stream derived from
//! `(seed, iso_code)`, so generation is reproducible and independent of
//! roster order: reordering or subsetting the roster never changes any
//! other country's rows.

pub mod progress;
pub mod roster;

use chrono::NaiveDate;
use epi_dash_panel_models::config::{
    ConfigError, DAILY_GROWTH_RANGE, DEATH_FRACTION_RANGE, EPIDEMIC_POPULATION_CAP,
    GeneratorConfig, HOSP_FRACTION_RANGE, ICU_FRACTION_RANGE, NEW_CASE_FRACTION_RANGE,
    NEW_DEATH_FRACTION_RANGE, VACCINATION_ANNUAL_PACE, VACCINATION_POPULATION_CAP,
    WAVE_AMPLITUDES, WAVE_PERIODS_DAYS,
};
use epi_dash_panel_models::{CountryProfile, DailyRecord};
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

use crate::progress::ProgressCallback;

/// Errors that can occur during panel generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Derives the pseudorandom stream for one country.
///
/// The stream is seeded from the first eight bytes of
/// `SHA-256("{seed}:{domain}:{iso_code}")`. The `domain` tag keeps draws
/// made for different purposes (population vs. daily counters) from
/// aliasing each other.
pub(crate) fn country_stream(seed: u64, domain: &str, iso_code: &str) -> StdRng {
    let digest = Sha256::digest(format!("{seed}:{domain}:{iso_code}").as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    StdRng::seed_from_u64(u64::from_le_bytes(bytes))
}

/// Generates the full panel for the given configuration.
///
/// Returns one row per (country, date) pair, grouped by country in roster
/// order with dates ascending within each country. An empty roster yields
/// an empty panel, not an error. Two calls with equal configurations
/// return identical output.
///
/// # Errors
///
/// Returns [`GeneratorError::Config`] if the configuration fails
/// validation (inverted date range, duplicate country, zero population).
pub fn generate(config: &GeneratorConfig) -> Result<Vec<DailyRecord>, GeneratorError> {
    generate_with_progress(config, progress::null_progress().as_ref())
}

/// Same as [`generate`], reporting per-country progress through `progress`.
///
/// # Errors
///
/// Returns [`GeneratorError::Config`] if the configuration fails
/// validation.
pub fn generate_with_progress(
    config: &GeneratorConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<DailyRecord>, GeneratorError> {
    config.validate()?;

    let num_days = usize::try_from(config.num_days()).unwrap_or(0);
    let mut panel = Vec::with_capacity(config.countries.len() * num_days);

    progress.set_total(config.countries.len() as u64);
    for profile in &config.countries {
        generate_country(profile, config, num_days, &mut panel);
        progress.inc(1);
    }
    progress.finish(format!(
        "Generated {} rows for {} countries",
        panel.len(),
        config.countries.len()
    ));

    log::info!(
        "Panel generated: {} countries x {num_days} days = {} rows (seed {})",
        config.countries.len(),
        panel.len(),
        config.seed
    );

    Ok(panel)
}

/// Appends all rows for one country to `panel`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn generate_country(
    profile: &CountryProfile,
    config: &GeneratorConfig,
    num_days: usize,
    panel: &mut Vec<DailyRecord>,
) {
    let mut rng = country_stream(config.seed, "daily", &profile.iso_code);

    // Per-country slope of the epidemic-size baseline, drawn once.
    let slope = rng.gen_range(DAILY_GROWTH_RANGE.0..DAILY_GROWTH_RANGE.1) as f64;
    let population = profile.population as f64;
    let baseline_cap = population * EPIDEMIC_POPULATION_CAP;

    for (day_index, date) in config.start_date.iter_days().take(num_days).enumerate() {
        let days_since_start = day_index as f64;
        let base = (days_since_start * slope).min(baseline_cap);

        let mut cases = base;
        for (amplitude, period) in WAVE_AMPLITUDES.iter().zip(WAVE_PERIODS_DAYS) {
            cases += (days_since_start / period).sin() * base * amplitude;
        }
        let total_cases = cases.max(0.0) as u64;

        let total_deaths = draw_fraction(&mut rng, total_cases, DEATH_FRACTION_RANGE);
        let new_cases = draw_fraction(&mut rng, total_cases, NEW_CASE_FRACTION_RANGE);
        let new_deaths = draw_fraction(&mut rng, new_cases, NEW_DEATH_FRACTION_RANGE);
        let hosp_patients = draw_fraction(&mut rng, new_cases, HOSP_FRACTION_RANGE);
        let icu_patients = draw_fraction(&mut rng, hosp_patients, ICU_FRACTION_RANGE);

        let (total_vaccinations, people_vaccinated, people_fully_vaccinated) =
            vaccination_counters(date, config.campaign_start, profile.population);

        panel.push(DailyRecord {
            country: profile.name.clone(),
            iso_code: profile.iso_code.clone(),
            continent: profile.continent,
            date,
            total_cases,
            new_cases,
            total_deaths,
            new_deaths,
            hosp_patients,
            icu_patients,
            total_vaccinations,
            people_vaccinated,
            people_fully_vaccinated,
            population: profile.population,
        });
    }
}

/// Draws a uniform fraction from `range` and applies it to `value`,
/// truncating to an integer.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn draw_fraction(rng: &mut StdRng, value: u64, range: (f64, f64)) -> u64 {
    (value as f64 * rng.gen_range(range.0..range.1)) as u64
}

/// Computes the vaccination counters for one date.
///
/// Counters are zero before `campaign_start`. From the campaign start the
/// cumulative dose count grows linearly, reaching
/// [`VACCINATION_ANNUAL_PACE`] times the population after one year and
/// capping at [`VACCINATION_POPULATION_CAP`] times the population.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn vaccination_counters(
    date: NaiveDate,
    campaign_start: NaiveDate,
    population: u64,
) -> (u64, u64, u64) {
    if date < campaign_start {
        return (0, 0, 0);
    }
    let days_since_campaign = (date - campaign_start).num_days() as f64;
    let pace = (days_since_campaign / 365.0 * VACCINATION_ANNUAL_PACE)
        .min(VACCINATION_POPULATION_CAP);
    let total_vaccinations = (population as f64 * pace) as u64;
    let people_vaccinated = total_vaccinations.min(population);
    let people_fully_vaccinated = total_vaccinations.saturating_sub(population);
    (total_vaccinations, people_vaccinated, people_fully_vaccinated)
}
