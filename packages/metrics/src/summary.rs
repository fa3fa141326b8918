//! Rolled-up summary statistics and panel inspection helpers.
//!
//! [`summarize`] produces the metric-card numbers a dashboard header
//! shows for the current view; the inspection helpers feed the sidebar
//! controls (country selector, date pickers) with the values the panel
//! actually covers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use epi_dash_metrics_models::{DerivedRecord, FilteredView, SummaryStats};
use epi_dash_panel_models::DailyRecord;

use crate::percentage;

/// Computes the summary statistics for a filtered view.
///
/// Per country the latest surviving row (maximum date) is taken;
/// cumulative counters are summed across those rows and the vaccination
/// rates averaged. The fatality rate over the summed totals is `None`
/// when the summed case count is zero — undefined, not zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(view: &FilteredView) -> SummaryStats {
    let mut latest: BTreeMap<&str, &DerivedRecord> = BTreeMap::new();
    for rec in &view.records {
        latest
            .entry(rec.daily.country.as_str())
            .and_modify(|current| {
                if rec.daily.date > current.daily.date {
                    *current = rec;
                }
            })
            .or_insert(rec);
    }

    let total_cases = latest.values().map(|r| r.daily.total_cases).sum();
    let total_deaths = latest.values().map(|r| r.daily.total_deaths).sum();
    let new_cases = latest.values().map(|r| r.daily.new_cases).sum();

    let rates: Vec<f64> = latest
        .values()
        .filter_map(|r| r.vaccination_rate)
        .collect();
    let mean_vaccination_rate = if rates.is_empty() {
        None
    } else {
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    };

    SummaryStats {
        total_cases,
        total_deaths,
        new_cases,
        mean_vaccination_rate,
        case_fatality_of_totals: percentage(total_deaths, total_cases),
        countries_analyzed: latest.len(),
    }
}

/// Returns the sorted, distinct country names present in the panel.
#[must_use]
pub fn country_list(panel: &[DailyRecord]) -> Vec<String> {
    let names: BTreeSet<&str> = panel.iter().map(|rec| rec.country.as_str()).collect();
    names.into_iter().map(ToString::to_string).collect()
}

/// Returns the earliest and latest dates covered by the panel, or `None`
/// for an empty panel.
#[must_use]
pub fn date_span(panel: &[DailyRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let first = panel.iter().map(|rec| rec.date).min()?;
    let last = panel.iter().map(|rec| rec.date).max()?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive_record;
    use epi_dash_metrics_models::FilteredView;
    use epi_dash_panel_models::Continent;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, d).unwrap()
    }

    fn row(
        country: &str,
        date: NaiveDate,
        total_cases: u64,
        total_deaths: u64,
        fully_vaccinated: u64,
    ) -> DailyRecord {
        DailyRecord {
            country: country.to_string(),
            iso_code: country[..3].to_uppercase(),
            continent: Continent::Europe,
            date,
            total_cases,
            new_cases: 10,
            total_deaths,
            new_deaths: 1,
            hosp_patients: 2,
            icu_patients: 1,
            total_vaccinations: fully_vaccinated * 2,
            people_vaccinated: fully_vaccinated,
            people_fully_vaccinated: fully_vaccinated,
            population: 1_000_000,
        }
    }

    fn view_of(rows: &[DailyRecord]) -> FilteredView {
        FilteredView {
            records: rows.iter().map(derive_record).collect(),
            notices: Vec::new(),
        }
    }

    #[test]
    fn sums_latest_row_per_country() {
        let view = view_of(&[
            row("Germany", day(1), 100, 10, 0),
            row("Germany", day(2), 200, 20, 0),
            row("France", day(1), 50, 5, 0),
        ]);
        let stats = summarize(&view);
        assert_eq!(stats.total_cases, 250);
        assert_eq!(stats.total_deaths, 25);
        assert_eq!(stats.countries_analyzed, 2);
        assert!((stats.case_fatality_of_totals.unwrap() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_total_cases_leaves_fatality_undefined() {
        let view = view_of(&[row("Germany", day(1), 0, 0, 0)]);
        let stats = summarize(&view);
        assert_eq!(stats.total_cases, 0);
        assert_eq!(stats.case_fatality_of_totals, None);
    }

    #[test]
    fn empty_view_summarizes_to_zeroes() {
        let stats = summarize(&FilteredView {
            records: Vec::new(),
            notices: Vec::new(),
        });
        assert_eq!(stats.total_cases, 0);
        assert_eq!(stats.countries_analyzed, 0);
        assert_eq!(stats.mean_vaccination_rate, None);
        assert_eq!(stats.case_fatality_of_totals, None);
    }

    #[test]
    fn averages_vaccination_rate_across_countries() {
        // 200k and 400k fully vaccinated of 1M: 20% and 40%.
        let view = view_of(&[
            row("Germany", day(1), 100, 10, 200_000),
            row("France", day(1), 100, 10, 400_000),
        ]);
        let stats = summarize(&view);
        assert!((stats.mean_vaccination_rate.unwrap() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn country_list_is_sorted_and_distinct() {
        let panel = vec![
            row("Sweden", day(1), 1, 0, 0),
            row("France", day(1), 1, 0, 0),
            row("Sweden", day(2), 1, 0, 0),
        ];
        assert_eq!(country_list(&panel), vec!["France", "Sweden"]);
    }

    #[test]
    fn date_span_covers_panel() {
        let panel = vec![
            row("Sweden", day(3), 1, 0, 0),
            row("Sweden", day(1), 1, 0, 0),
            row("Sweden", day(9), 1, 0, 0),
        ];
        assert_eq!(date_span(&panel), Some((day(1), day(9))));
        assert_eq!(date_span(&[]), None);
    }
}
