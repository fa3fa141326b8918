#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI consumer for the synthetic COVID-19 panel core.
//!
//! Stands in for the dashboard presentation layer: generates the panel,
//! runs filter requests against it, prints the metric-card summary, and
//! exports the derived table as CSV. Run without a subcommand for a
//! guided interactive session that reuses one cached panel across
//! repeated filter rounds the way a dashboard session would.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! progress bars never fight for the terminal.

mod interactive;
mod progress;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use epi_dash_metrics::summary::summarize;
use epi_dash_metrics_models::{
    AnalysisFocus, DerivedRecord, FilterOptions, FilterParams, FilteredView, SummaryStats,
};
use epi_dash_panel::roster::default_roster;
use epi_dash_panel_models::config::{
    DEFAULT_SEED, GeneratorConfig, default_end_date, default_start_date,
};
use indicatif::MultiProgress;

use crate::progress::IndicatifProgress;

#[derive(Parser)]
#[command(name = "epi-dash", about = "Synthetic COVID-19 panel toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full panel and export it as CSV
    Generate {
        /// Seed fixing all pseudorandom draws
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// First day of the panel (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the panel, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output CSV path
        #[arg(long, default_value = "panel.csv")]
        output: PathBuf,
    },
    /// Filter the panel and export the derived table
    Filter {
        /// Seed fixing all pseudorandom draws
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Comma-separated country names; empty falls back to the
        /// default country
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
        /// First day of the interval (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the interval, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Compute the 7-day moving averages
        #[arg(long)]
        moving_average: bool,
        /// Per-capita rendering hint, recorded with the request
        #[arg(long)]
        per_capita: bool,
        /// Log-scale rendering hint, recorded with the request
        #[arg(long)]
        log_scale: bool,
        /// Primary analysis focus
        #[arg(long, default_value = "overview")]
        focus: AnalysisFocus,
        /// Output CSV path
        #[arg(long, default_value = "filtered.csv")]
        output: PathBuf,
    },
    /// Print the metric-card summary for a filtered view
    Summary {
        /// Seed fixing all pseudorandom draws
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Comma-separated country names; empty falls back to the
        /// default country
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
        /// First day of the interval (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the interval, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Primary analysis focus
        #[arg(long, default_value = "overview")]
        focus: AnalysisFocus,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate {
            seed,
            from,
            to,
            output,
        }) => generate(&multi, seed, from, to, &output),
        Some(Commands::Filter {
            seed,
            countries,
            from,
            to,
            moving_average,
            per_capita,
            log_scale,
            focus,
            output,
        }) => {
            let options = FilterOptions {
                moving_average,
                per_capita,
                log_scale,
            };
            let view = run_filter(&multi, seed, countries, from, to, focus, options)?;
            epi_dash_export::write_csv_path(&view.records, &output)?;
            print_summary(&summarize(&view));
            print_focus_detail(&view, focus);
            Ok(())
        }
        Some(Commands::Summary {
            seed,
            countries,
            from,
            to,
            focus,
        }) => {
            let view = run_filter(
                &multi,
                seed,
                countries,
                from,
                to,
                focus,
                FilterOptions::default(),
            )?;
            if view.records.is_empty() {
                println!("No data available for the selected criteria.");
            } else {
                print_summary(&summarize(&view));
                print_focus_detail(&view, focus);
            }
            Ok(())
        }
        None => interactive::run(&multi),
    }
}

/// Builds the generator configuration for the default roster.
fn build_config(seed: u64, from: Option<NaiveDate>, to: Option<NaiveDate>) -> GeneratorConfig {
    GeneratorConfig::new(
        default_roster(seed),
        from.unwrap_or_else(default_start_date),
        to.unwrap_or_else(default_end_date),
        seed,
    )
}

/// Generates the full panel and exports every row with derived fields.
fn generate(
    multi: &MultiProgress,
    seed: u64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(seed, from, to);
    let bar = IndicatifProgress::countries_bar(multi, "Generating panel");
    let panel = epi_dash_panel::generate_with_progress(&config, bar.as_ref())?;

    let records: Vec<DerivedRecord> = panel.iter().map(epi_dash_metrics::derive_record).collect();
    epi_dash_export::write_csv_path(&records, output)?;
    println!(
        "Exported {} rows for {} countries to {}",
        records.len(),
        config.countries.len(),
        output.display()
    );
    Ok(())
}

/// Generates the full default-range panel and runs one filter request
/// against it.
fn run_filter(
    multi: &MultiProgress,
    seed: u64,
    countries: Vec<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    focus: AnalysisFocus,
    options: FilterOptions,
) -> Result<FilteredView, Box<dyn std::error::Error>> {
    let config = build_config(seed, None, None);
    let bar = IndicatifProgress::countries_bar(multi, "Generating panel");
    let panel = epi_dash_panel::generate_with_progress(&config, bar.as_ref())?;

    let params = FilterParams {
        countries,
        date_from: from.unwrap_or(config.start_date),
        date_to: to.unwrap_or(config.end_date),
        focus,
        options,
    };
    let view = epi_dash_metrics::filter_and_derive(&panel, &params)?;
    for notice in &view.notices {
        log::warn!("{notice}");
    }
    Ok(view)
}

/// Prints the four metric cards the dashboard header shows.
fn print_summary(stats: &SummaryStats) {
    println!();
    println!("Total cases:        {}", stats.total_cases);
    match stats.case_fatality_of_totals {
        Some(cfr) => println!("Total deaths:       {} ({cfr:.2}% CFR)", stats.total_deaths),
        None => println!("Total deaths:       {} (CFR undefined)", stats.total_deaths),
    }
    match stats.mean_vaccination_rate {
        Some(rate) => println!("Avg vaccination:    {rate:.1}% fully vaccinated"),
        None => println!("Avg vaccination:    n/a"),
    }
    println!("Countries analyzed: {}", stats.countries_analyzed);
    println!("New cases (latest): {}", stats.new_cases);
}

/// Prints a focus-specific detail line computed from the latest row per
/// country.
fn print_focus_detail(view: &FilteredView, focus: AnalysisFocus) {
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

    match focus {
        AnalysisFocus::Hospitalizations => {
            let hosp: u64 = latest.values().map(|r| r.daily.hosp_patients).sum();
            let icu: u64 = latest.values().map(|r| r.daily.icu_patients).sum();
            println!("Hospital patients:  {hosp} ({icu} in ICU)");
        }
        AnalysisFocus::Vaccinations => {
            let doses: u64 = latest.values().map(|r| r.daily.total_vaccinations).sum();
            println!("Doses administered: {doses}");
        }
        AnalysisFocus::Overview | AnalysisFocus::CasesDeaths => {}
    }
}
