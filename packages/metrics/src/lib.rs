#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filtering and derived-metric computation over the panel.
//!
//! [`filter_and_derive`] is called on every dashboard interaction: it
//! selects the rows matching the request, appends the derived rates, and
//! computes the trailing means when asked. It never mutates the panel —
//! the cached panel is shared read-only and each call builds a fresh view.

pub mod summary;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use epi_dash_metrics_models::{DerivedRecord, FilterParams, FilteredView, Notice};
use epi_dash_panel_models::DailyRecord;
use thiserror::Error;

/// Country substituted when the selection is empty, so a session never
/// renders a blank dashboard.
pub const DEFAULT_COUNTRY: &str = "United States";

/// Trailing window width, in days, for the moving averages.
pub const MOVING_AVERAGE_WINDOW: usize = 7;

/// Errors that can occur while filtering.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The interval start is after its end.
    #[error("date interval start {from} is after end {to}")]
    InvalidDateRange {
        /// Requested start of the interval.
        from: NaiveDate,
        /// Requested end of the interval.
        to: NaiveDate,
    },
}

/// Filters the panel down to the requested countries and date interval
/// and appends the derived fields.
///
/// An empty country selection substitutes [`DEFAULT_COUNTRY`] and
/// records a [`Notice::FallbackCountry`] on the view. An interval with
/// no surviving rows is a valid outcome: the view is empty and the
/// caller decides how to present "no data". When
/// `params.options.moving_average` is set, the 7-day trailing means are
/// computed per country over the *filtered* window only, shrinking at
/// the window start rather than reaching back into excluded rows.
///
/// # Errors
///
/// Returns [`MetricsError::InvalidDateRange`] if `date_from` is after
/// `date_to`.
pub fn filter_and_derive(
    panel: &[DailyRecord],
    params: &FilterParams,
) -> Result<FilteredView, MetricsError> {
    if params.date_from > params.date_to {
        return Err(MetricsError::InvalidDateRange {
            from: params.date_from,
            to: params.date_to,
        });
    }

    let mut notices = Vec::new();
    let selected: BTreeSet<&str> = if params.countries.is_empty() {
        let notice = Notice::FallbackCountry {
            fallback: DEFAULT_COUNTRY.to_string(),
        };
        log::warn!("{notice}");
        notices.push(notice);
        std::iter::once(DEFAULT_COUNTRY).collect()
    } else {
        params.countries.iter().map(String::as_str).collect()
    };

    let mut records: Vec<DerivedRecord> = panel
        .iter()
        .filter(|rec| {
            selected.contains(rec.country.as_str())
                && rec.date >= params.date_from
                && rec.date <= params.date_to
        })
        .map(derive_record)
        .collect();

    if params.options.moving_average {
        apply_moving_averages(&mut records);
    }

    log::debug!(
        "Filter kept {} of {} rows ({} countries, {} to {})",
        records.len(),
        panel.len(),
        selected.len(),
        params.date_from,
        params.date_to
    );

    Ok(FilteredView { records, notices })
}

/// Appends the derived rates to one panel row.
///
/// Each rate is `None` when its denominator is zero: an undefined rate
/// is reported as missing, never as zero.
#[must_use]
pub fn derive_record(daily: &DailyRecord) -> DerivedRecord {
    DerivedRecord {
        daily: daily.clone(),
        case_fatality_rate: percentage(daily.total_deaths, daily.total_cases),
        vaccination_rate: percentage(daily.people_fully_vaccinated, daily.population),
        hospitalization_rate: percentage(daily.hosp_patients, daily.new_cases),
        icu_rate: percentage(daily.icu_patients, daily.hosp_patients),
        new_cases_ma: None,
        new_deaths_ma: None,
    }
}

/// `numerator / denominator * 100`, or `None` when the denominator is
/// zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64 * 100.0)
    }
}

/// Computes the trailing means of `new_cases`/`new_deaths` per country.
///
/// Records are grouped by country, preserving their order within the
/// view (the panel emits dates ascending per country). The first
/// `MOVING_AVERAGE_WINDOW - 1` rows of each country average over a
/// shrinking window.
#[allow(clippy::cast_precision_loss)]
fn apply_moving_averages(records: &mut [DerivedRecord]) {
    let mut by_country: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, rec) in records.iter().enumerate() {
        by_country
            .entry(rec.daily.country.clone())
            .or_default()
            .push(idx);
    }

    for indices in by_country.values() {
        for (pos, &idx) in indices.iter().enumerate() {
            let start = pos.saturating_sub(MOVING_AVERAGE_WINDOW - 1);
            let window = &indices[start..=pos];
            let len = window.len() as f64;
            let cases: u64 = window.iter().map(|&i| records[i].daily.new_cases).sum();
            let deaths: u64 = window.iter().map(|&i| records[i].daily.new_deaths).sum();
            records[idx].new_cases_ma = Some(cases as f64 / len);
            records[idx].new_deaths_ma = Some(deaths as f64 / len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_dash_metrics_models::{AnalysisFocus, FilterOptions};
    use epi_dash_panel_models::Continent;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    fn row(country: &str, date: NaiveDate, new_cases: u64, new_deaths: u64) -> DailyRecord {
        DailyRecord {
            country: country.to_string(),
            iso_code: country[..3].to_uppercase(),
            continent: Continent::Europe,
            date,
            total_cases: 1000,
            new_cases,
            total_deaths: 50,
            new_deaths,
            hosp_patients: 10,
            icu_patients: 3,
            total_vaccinations: 0,
            people_vaccinated: 0,
            people_fully_vaccinated: 0,
            population: 1_000_000,
        }
    }

    fn params(countries: &[&str], from: NaiveDate, to: NaiveDate) -> FilterParams {
        FilterParams {
            countries: countries.iter().map(ToString::to_string).collect(),
            date_from: from,
            date_to: to,
            focus: AnalysisFocus::Overview,
            options: FilterOptions::default(),
        }
    }

    fn two_country_panel() -> Vec<DailyRecord> {
        let mut panel = Vec::new();
        for d in 1..=10 {
            panel.push(row("Germany", day(d), u64::from(d) * 10, u64::from(d)));
        }
        for d in 1..=10 {
            panel.push(row("France", day(d), u64::from(d) * 5, u64::from(d)));
        }
        panel
    }

    #[test]
    fn keeps_only_selected_countries_and_dates() {
        let panel = two_country_panel();
        let view = filter_and_derive(&panel, &params(&["Germany"], day(3), day(5))).unwrap();
        assert_eq!(view.records.len(), 3);
        assert!(
            view.records
                .iter()
                .all(|r| r.daily.country == "Germany" && r.daily.date >= day(3) && r.daily.date <= day(5))
        );
        assert!(view.notices.is_empty());
    }

    #[test]
    fn empty_selection_falls_back_with_notice() {
        let mut panel = two_country_panel();
        for d in 1..=3 {
            panel.push(row(DEFAULT_COUNTRY, day(d), 100, 1));
        }
        let view = filter_and_derive(&panel, &params(&[], day(1), day(10))).unwrap();
        assert!(view.fallback_applied());
        assert_eq!(view.records.len(), 3);
        assert!(view.records.iter().all(|r| r.daily.country == DEFAULT_COUNTRY));
    }

    #[test]
    fn interval_outside_data_is_empty_not_error() {
        let panel = two_country_panel();
        let view = filter_and_derive(
            &panel,
            &params(&["Germany"], day(20), day(25)),
        )
        .unwrap();
        assert!(view.records.is_empty());
        assert!(view.notices.is_empty());
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let panel = two_country_panel();
        assert!(matches!(
            filter_and_derive(&panel, &params(&["Germany"], day(5), day(3))),
            Err(MetricsError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn moving_average_uses_shrinking_trailing_window() {
        let panel: Vec<DailyRecord> = (1..=8)
            .map(|d| row("Germany", day(d), u64::from(d) * 10, 0))
            .collect();
        let mut request = params(&["Germany"], day(1), day(8));
        request.options.moving_average = true;

        let view = filter_and_derive(&panel, &request).unwrap();
        let ma: Vec<f64> = view
            .records
            .iter()
            .map(|r| r.new_cases_ma.unwrap())
            .collect();

        // Shrinking window at the start: day 1 averages only itself.
        assert!((ma[0] - 10.0).abs() < f64::EPSILON);
        assert!((ma[1] - 15.0).abs() < f64::EPSILON);
        // Full window at day 8: mean(20..=80 step 10) = 50.
        assert!((ma[7] - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn moving_average_only_sees_filtered_window() {
        let panel: Vec<DailyRecord> = (1..=10)
            .map(|d| row("Germany", day(d), u64::from(d) * 10, 0))
            .collect();
        let mut request = params(&["Germany"], day(8), day(10));
        request.options.moving_average = true;

        let view = filter_and_derive(&panel, &request).unwrap();
        // First filtered day averages itself only, not days 2..=7.
        assert!((view.records[0].new_cases_ma.unwrap() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn moving_averages_are_per_country() {
        let panel = two_country_panel();
        let mut request = params(&["Germany", "France"], day(1), day(10));
        request.options.moving_average = true;

        let view = filter_and_derive(&panel, &request).unwrap();
        let germany_last = view
            .records
            .iter()
            .filter(|r| r.daily.country == "Germany")
            .next_back()
            .unwrap();
        let france_last = view
            .records
            .iter()
            .filter(|r| r.daily.country == "France")
            .next_back()
            .unwrap();
        // mean(40..=100 step 10) = 70 and mean(20..=50 step 5) = 35.
        assert!((germany_last.new_cases_ma.unwrap() - 70.0).abs() < f64::EPSILON);
        assert!((france_last.new_cases_ma.unwrap() - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn moving_average_absent_unless_requested() {
        let panel = two_country_panel();
        let view = filter_and_derive(&panel, &params(&["Germany"], day(1), day(10))).unwrap();
        assert!(view.records.iter().all(|r| r.new_cases_ma.is_none()));
    }

    #[test]
    fn zero_denominators_yield_missing_rates() {
        let mut rec = row("Germany", day(1), 0, 0);
        rec.total_cases = 0;
        rec.hosp_patients = 0;
        rec.icu_patients = 0;
        let derived = derive_record(&rec);
        assert_eq!(derived.case_fatality_rate, None);
        assert_eq!(derived.hospitalization_rate, None);
        assert_eq!(derived.icu_rate, None);
        // Population is positive, so the vaccination rate is defined.
        assert_eq!(derived.vaccination_rate, Some(0.0));
    }

    #[test]
    fn derived_rates_match_hand_computation() {
        let mut rec = row("Germany", day(1), 200, 2);
        rec.total_cases = 10_000;
        rec.total_deaths = 250;
        rec.hosp_patients = 30;
        rec.icu_patients = 6;
        let derived = derive_record(&rec);
        assert!((derived.case_fatality_rate.unwrap() - 2.5).abs() < f64::EPSILON);
        assert!((derived.hospitalization_rate.unwrap() - 15.0).abs() < f64::EPSILON);
        assert!((derived.icu_rate.unwrap() - 20.0).abs() < f64::EPSILON);
    }
}
