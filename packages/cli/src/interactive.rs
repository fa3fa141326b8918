//! Guided interactive session.
//!
//! Walks the user through the same controls the dashboard sidebar
//! offers: country multi-select, date interval, primary focus, and the
//! analysis options. One [`PanelCache`] is reused across rounds, so
//! every filter after the first runs against the cached panel.

use std::cmp::max;

use chrono::{Duration, NaiveDate};
use dialoguer::{Confirm, Input, MultiSelect, Select};
use epi_dash_cache::PanelCache;
use epi_dash_metrics::summary::{country_list, date_span, summarize};
use epi_dash_metrics_models::{AnalysisFocus, FilterOptions, FilterParams};
use epi_dash_panel::progress::null_progress;
use epi_dash_panel::roster::default_roster;
use epi_dash_panel_models::config::{
    DEFAULT_SEED, GeneratorConfig, default_end_date, default_start_date,
};
use indicatif::MultiProgress;

use crate::progress::IndicatifProgress;

/// Countries preselected in the multi-select, mirroring the dashboard's
/// default comparison set.
const DEFAULT_SELECTION: &[&str] = &["United States", "United Kingdom", "Germany"];

/// Runs the guided session until the user declines another round.
///
/// # Errors
///
/// Returns an error if a prompt, generation, or export fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("epi-dash panel explorer");
    println!();

    let seed: u64 = Input::new()
        .with_prompt("Seed")
        .default(DEFAULT_SEED)
        .interact_text()?;
    let config = GeneratorConfig::new(
        default_roster(seed),
        default_start_date(),
        default_end_date(),
        seed,
    );

    let cache = PanelCache::default();
    let mut first_round = true;

    loop {
        // Only the first round can miss the cache; later rounds return
        // the shared panel instantly, so they skip the progress bar.
        let panel = if first_round {
            let bar = IndicatifProgress::countries_bar(multi, "Generating panel");
            cache.get_or_generate_with_progress(&config, bar.as_ref())?
        } else {
            cache.get_or_generate_with_progress(&config, null_progress().as_ref())?
        };
        first_round = false;

        let countries = country_list(&panel);
        let preselected: Vec<bool> = countries
            .iter()
            .map(|name| DEFAULT_SELECTION.contains(&name.as_str()))
            .collect();
        let picked = MultiSelect::new()
            .with_prompt("Countries to analyze")
            .items(&countries)
            .defaults(&preselected)
            .interact()?;
        let selected: Vec<String> = picked.iter().map(|&i| countries[i].clone()).collect();

        let (min_date, max_date) =
            date_span(&panel).unwrap_or((config.start_date, config.end_date));
        // Default to the last year of data, like the dashboard does.
        let default_from = max(min_date, max_date - Duration::days(365));
        let date_from: NaiveDate = Input::new()
            .with_prompt("Start date (YYYY-MM-DD)")
            .default(default_from)
            .interact_text()?;
        let date_to: NaiveDate = Input::new()
            .with_prompt("End date (YYYY-MM-DD)")
            .default(max_date)
            .interact_text()?;

        let focus_labels: Vec<&str> = AnalysisFocus::all().iter().map(AsRef::as_ref).collect();
        let focus_idx = Select::new()
            .with_prompt("Primary focus")
            .items(&focus_labels)
            .default(0)
            .interact()?;
        let focus = AnalysisFocus::all()[focus_idx];

        let options = FilterOptions {
            moving_average: Confirm::new()
                .with_prompt("Apply 7-day moving average?")
                .default(true)
                .interact()?,
            per_capita: Confirm::new()
                .with_prompt("Show per capita metrics?")
                .default(true)
                .interact()?,
            log_scale: Confirm::new()
                .with_prompt("Use logarithmic scale for large numbers?")
                .default(false)
                .interact()?,
        };

        let params = FilterParams {
            countries: selected,
            date_from,
            date_to,
            focus,
            options,
        };

        match epi_dash_metrics::filter_and_derive(&panel, &params) {
            Ok(view) => {
                for notice in &view.notices {
                    log::warn!("{notice}");
                }
                if view.records.is_empty() {
                    println!("No data available for the selected criteria.");
                } else {
                    crate::print_summary(&summarize(&view));
                    crate::print_focus_detail(&view, focus);
                    println!();

                    if Confirm::new()
                        .with_prompt("Export filtered data to CSV?")
                        .default(false)
                        .interact()?
                    {
                        let path: String = Input::new()
                            .with_prompt("Output path")
                            .default("filtered.csv".to_string())
                            .interact_text()?;
                        epi_dash_export::write_csv_path(
                            &view.records,
                            std::path::Path::new(&path),
                        )?;
                        println!("Wrote {} rows to {path}", view.records.len());
                    }
                }
            }
            Err(err) => log::error!("Filter failed: {err}"),
        }

        if !Confirm::new()
            .with_prompt("Run another filter?")
            .default(true)
            .interact()?
        {
            break;
        }
    }

    Ok(())
}
