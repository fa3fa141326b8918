#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter parameters and derived result types for the metrics layer.
//!
//! Defines the input a dashboard session sends on every interaction
//! ([`FilterParams`]) and the outputs it renders: metric-augmented rows
//! ([`DerivedRecord`]), warning-level notices ([`Notice`]), and the
//! rolled-up metric-card numbers ([`SummaryStats`]).

use chrono::NaiveDate;
use epi_dash_panel_models::DailyRecord;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Primary analysis focus selected in the dashboard sidebar.
///
/// A presentation routing hint: the metrics layer computes the same table
/// regardless, and the consumer decides which panels to render.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisFocus {
    /// Combined key-metric view.
    #[default]
    Overview,
    /// Cases and deaths trends.
    CasesDeaths,
    /// Hospital and ICU occupancy.
    Hospitalizations,
    /// Vaccination progress.
    Vaccinations,
}

impl AnalysisFocus {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Overview,
            Self::CasesDeaths,
            Self::Hospitalizations,
            Self::Vaccinations,
        ]
    }
}

/// Boolean analysis options from the dashboard's advanced controls.
///
/// Only `moving_average` changes what the metrics layer computes;
/// `per_capita` and `log_scale` travel with the request so the consumer
/// can apply them at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Compute 7-day trailing means of the daily counters.
    pub moving_average: bool,
    /// Render counters per capita (consumer-side hint).
    pub per_capita: bool,
    /// Render large counters on a logarithmic scale (consumer-side hint).
    pub log_scale: bool,
}

/// One filter request: countries, inclusive date interval, and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// Selected country names. Empty selects the documented fallback
    /// country instead of producing a blank dashboard.
    pub countries: Vec<String>,
    /// First day of the interval (inclusive).
    pub date_from: NaiveDate,
    /// Last day of the interval (inclusive).
    pub date_to: NaiveDate,
    /// Primary analysis focus (presentation hint).
    pub focus: AnalysisFocus,
    /// Analysis options.
    pub options: FilterOptions,
}

/// A panel row augmented with the derived rates, and the trailing means
/// when requested.
///
/// Every rate is `None` when its denominator is zero — an undefined rate
/// is represented explicitly, never as `NaN` and never as a misleading
/// zero. Recomputed on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRecord {
    /// The underlying panel row.
    #[serde(flatten)]
    pub daily: DailyRecord,
    /// `total_deaths / total_cases * 100`; `None` when no cases.
    pub case_fatality_rate: Option<f64>,
    /// `people_fully_vaccinated / population * 100`.
    pub vaccination_rate: Option<f64>,
    /// `hosp_patients / new_cases * 100`; `None` when no new cases.
    pub hospitalization_rate: Option<f64>,
    /// `icu_patients / hosp_patients * 100`; `None` when nobody is
    /// hospitalized.
    pub icu_rate: Option<f64>,
    /// 7-day trailing mean of `new_cases`; `None` unless requested.
    pub new_cases_ma: Option<f64>,
    /// 7-day trailing mean of `new_deaths`; `None` unless requested.
    pub new_deaths_ma: Option<f64>,
}

/// Warning-level notice attached to a filtered view.
///
/// Notices flag substitutions the filter made on the caller's behalf;
/// they are not errors and the rows alongside them are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notice {
    /// The country selection was empty, so the documented fallback
    /// country was substituted.
    FallbackCountry {
        /// Name of the substituted country.
        fallback: String,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FallbackCountry { fallback } => {
                write!(f, "no countries selected; showing data for {fallback}")
            }
        }
    }
}

/// A filtered, metric-augmented slice of the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredView {
    /// Surviving rows in panel order, with derived fields appended.
    pub records: Vec<DerivedRecord>,
    /// Warning-level notices raised while filtering.
    pub notices: Vec<Notice>,
}

impl FilteredView {
    /// Returns `true` if the fallback country was substituted for an
    /// empty selection.
    #[must_use]
    pub fn fallback_applied(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n, Notice::FallbackCountry { .. }))
    }
}

/// Rolled-up metric-card numbers for a filtered view.
///
/// Totals are taken from each country's latest surviving row (cumulative
/// counters already embed history), then summed across countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Latest `total_cases` summed across countries.
    pub total_cases: u64,
    /// Latest `total_deaths` summed across countries.
    pub total_deaths: u64,
    /// Latest `new_cases` summed across countries.
    pub new_cases: u64,
    /// Mean of the countries' latest vaccination rates; `None` when the
    /// view is empty.
    pub mean_vaccination_rate: Option<f64>,
    /// `total_deaths / total_cases * 100` over the summed totals; `None`
    /// when the summed case count is zero.
    pub case_fatality_of_totals: Option<f64>,
    /// Number of distinct countries in the view.
    pub countries_analyzed: usize,
}
