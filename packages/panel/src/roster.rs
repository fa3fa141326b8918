//! Default country roster.
//!
//! Twenty countries spanning all six continents, mirroring the coverage of
//! the public Our World in Data dataset the synthetic panel stands in for.
//! Populations are drawn deterministically from the seed so the roster is a
//! pure function of its input.

use epi_dash_panel_models::config::POPULATION_RANGE;
use epi_dash_panel_models::{Continent, CountryProfile};
use rand::Rng as _;

use crate::country_stream;

/// (name, ISO 3166-1 alpha-3, continent) for the default roster.
const DEFAULT_COUNTRIES: &[(&str, &str, Continent)] = &[
    ("United States", "USA", Continent::NorthAmerica),
    ("United Kingdom", "GBR", Continent::Europe),
    ("Germany", "DEU", Continent::Europe),
    ("France", "FRA", Continent::Europe),
    ("Italy", "ITA", Continent::Europe),
    ("Spain", "ESP", Continent::Europe),
    ("India", "IND", Continent::Asia),
    ("Brazil", "BRA", Continent::SouthAmerica),
    ("Japan", "JPN", Continent::Asia),
    ("South Korea", "KOR", Continent::Asia),
    ("Australia", "AUS", Continent::Oceania),
    ("Canada", "CAN", Continent::NorthAmerica),
    ("Netherlands", "NLD", Continent::Europe),
    ("Sweden", "SWE", Continent::Europe),
    ("Kenya", "KEN", Continent::Africa),
    ("South Africa", "ZAF", Continent::Africa),
    ("Nigeria", "NGA", Continent::Africa),
    ("Egypt", "EGY", Continent::Africa),
    ("Mexico", "MEX", Continent::NorthAmerica),
    ("Argentina", "ARG", Continent::SouthAmerica),
];

/// Builds the default 20-country roster for the given seed.
///
/// Each population is drawn from [`POPULATION_RANGE`] using a sub-stream
/// derived from `(seed, iso_code)`, so removing or reordering entries
/// never changes the population of any other country.
#[must_use]
pub fn default_roster(seed: u64) -> Vec<CountryProfile> {
    DEFAULT_COUNTRIES
        .iter()
        .map(|&(name, iso_code, continent)| {
            let mut rng = country_stream(seed, "population", iso_code);
            CountryProfile {
                name: name.to_string(),
                iso_code: iso_code.to_string(),
                continent,
                population: rng.gen_range(POPULATION_RANGE.0..POPULATION_RANGE.1),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_has_twenty_countries() {
        assert_eq!(default_roster(42).len(), 20);
    }

    #[test]
    fn roster_is_deterministic() {
        assert_eq!(default_roster(42), default_roster(42));
    }

    #[test]
    fn seed_changes_populations() {
        let a = default_roster(42);
        let b = default_roster(43);
        assert!(a.iter().zip(&b).any(|(x, y)| x.population != y.population));
    }

    #[test]
    fn populations_within_range() {
        for profile in default_roster(42) {
            assert!(profile.population >= POPULATION_RANGE.0);
            assert!(profile.population < POPULATION_RANGE.1);
        }
    }

    #[test]
    fn iso_codes_are_unique() {
        let roster = default_roster(42);
        let codes: std::collections::BTreeSet<&str> =
            roster.iter().map(|p| p.iso_code.as_str()).collect();
        assert_eq!(codes.len(), roster.len());
    }

    #[test]
    fn covers_all_continents() {
        let roster = default_roster(42);
        for continent in Continent::all() {
            assert!(roster.iter().any(|p| p.continent == *continent));
        }
    }
}
