#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Delimited-text export of filtered, derived tables.
//!
//! The column order and names below are a compatibility contract:
//! downstream consumers parse exported files by header, so columns are
//! written explicitly in a fixed order rather than derived from struct
//! layout. Dates are formatted as `YYYY-MM-DD`; undefined rates and
//! absent moving averages are empty fields, never `NaN` and never zero.
//!
//! [`read_csv`] re-parses an exported file into the same records,
//! row-for-row — the round trip is lossless.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use epi_dash_metrics_models::DerivedRecord;
use epi_dash_panel_models::{Continent, DailyRecord};
use thiserror::Error;

/// Column headers, in the order they are written. Append-only: existing
/// positions must not change between versions.
pub const HEADERS: [&str; 20] = [
    "iso_code",
    "continent",
    "location",
    "date",
    "total_cases",
    "new_cases",
    "total_deaths",
    "new_deaths",
    "hosp_patients",
    "icu_patients",
    "total_vaccinations",
    "people_vaccinated",
    "people_fully_vaccinated",
    "population",
    "case_fatality_rate",
    "vaccination_rate",
    "hospitalization_rate",
    "icu_rate",
    "new_cases_ma",
    "new_deaths_ma",
];

/// Date column format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur during export or re-import.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization or parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file's header row does not match the export contract.
    #[error("header mismatch: expected '{expected}', found '{found}'")]
    InvalidHeader {
        /// The contractual header row.
        expected: String,
        /// The header row actually present.
        found: String,
    },

    /// A field could not be parsed.
    #[error("row {row}, column '{column}': {message}")]
    InvalidField {
        /// 1-based data row number (excluding the header).
        row: u64,
        /// Column name.
        column: &'static str,
        /// Description of the parse failure.
        message: String,
    },
}

/// Writes the records as CSV with the contractual header row.
///
/// # Errors
///
/// Returns [`ExportError`] if writing fails.
pub fn write_csv<W: Write>(records: &[DerivedRecord], writer: W) -> Result<(), ExportError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADERS)?;

    for rec in records {
        out.write_record(&[
            rec.daily.iso_code.clone(),
            rec.daily.continent.to_string(),
            rec.daily.country.clone(),
            rec.daily.date.format(DATE_FORMAT).to_string(),
            rec.daily.total_cases.to_string(),
            rec.daily.new_cases.to_string(),
            rec.daily.total_deaths.to_string(),
            rec.daily.new_deaths.to_string(),
            rec.daily.hosp_patients.to_string(),
            rec.daily.icu_patients.to_string(),
            rec.daily.total_vaccinations.to_string(),
            rec.daily.people_vaccinated.to_string(),
            rec.daily.people_fully_vaccinated.to_string(),
            rec.daily.population.to_string(),
            optional_field(rec.case_fatality_rate),
            optional_field(rec.vaccination_rate),
            optional_field(rec.hospitalization_rate),
            optional_field(rec.icu_rate),
            optional_field(rec.new_cases_ma),
            optional_field(rec.new_deaths_ma),
        ])?;
    }

    out.flush()?;
    Ok(())
}

/// Writes the records to a file at `path`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or writing
/// fails.
pub fn write_csv_path(records: &[DerivedRecord], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(records, file)?;
    log::info!("Exported {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Parses an exported file back into derived records.
///
/// # Errors
///
/// Returns [`ExportError::InvalidHeader`] if the header row deviates
/// from the contract, and [`ExportError::InvalidField`] naming the row
/// and column for any unparseable value.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<DerivedRecord>, ExportError> {
    let mut input = csv::Reader::from_reader(reader);

    let found = input.headers()?.clone();
    if found.iter().ne(HEADERS) {
        return Err(ExportError::InvalidHeader {
            expected: HEADERS.join(","),
            found: found.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut records = Vec::new();
    for (idx, result) in input.records().enumerate() {
        let row = idx as u64 + 1;
        let fields = result?;
        records.push(parse_row(row, &fields)?);
    }
    Ok(records)
}

/// Reads an exported file from `path`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be opened or parsed.
pub fn read_csv_path(path: &Path) -> Result<Vec<DerivedRecord>, ExportError> {
    let file = File::open(path)?;
    read_csv(file)
}

fn optional_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_row(row: u64, fields: &csv::StringRecord) -> Result<DerivedRecord, ExportError> {
    let field = |column: usize| fields.get(column).unwrap_or_default();

    let continent: Continent = field(1).parse().map_err(|_| ExportError::InvalidField {
        row,
        column: "continent",
        message: format!("unknown continent '{}'", field(1)),
    })?;
    let date = chrono::NaiveDate::parse_from_str(field(3), DATE_FORMAT).map_err(|e| {
        ExportError::InvalidField {
            row,
            column: "date",
            message: e.to_string(),
        }
    })?;

    Ok(DerivedRecord {
        daily: DailyRecord {
            country: field(2).to_string(),
            iso_code: field(0).to_string(),
            continent,
            date,
            total_cases: parse_counter(row, "total_cases", field(4))?,
            new_cases: parse_counter(row, "new_cases", field(5))?,
            total_deaths: parse_counter(row, "total_deaths", field(6))?,
            new_deaths: parse_counter(row, "new_deaths", field(7))?,
            hosp_patients: parse_counter(row, "hosp_patients", field(8))?,
            icu_patients: parse_counter(row, "icu_patients", field(9))?,
            total_vaccinations: parse_counter(row, "total_vaccinations", field(10))?,
            people_vaccinated: parse_counter(row, "people_vaccinated", field(11))?,
            people_fully_vaccinated: parse_counter(row, "people_fully_vaccinated", field(12))?,
            population: parse_counter(row, "population", field(13))?,
        },
        case_fatality_rate: parse_rate(row, "case_fatality_rate", field(14))?,
        vaccination_rate: parse_rate(row, "vaccination_rate", field(15))?,
        hospitalization_rate: parse_rate(row, "hospitalization_rate", field(16))?,
        icu_rate: parse_rate(row, "icu_rate", field(17))?,
        new_cases_ma: parse_rate(row, "new_cases_ma", field(18))?,
        new_deaths_ma: parse_rate(row, "new_deaths_ma", field(19))?,
    })
}

fn parse_counter(row: u64, column: &'static str, value: &str) -> Result<u64, ExportError> {
    value.parse().map_err(|_| ExportError::InvalidField {
        row,
        column,
        message: format!("expected non-negative integer, found '{value}'"),
    })
}

fn parse_rate(row: u64, column: &'static str, value: &str) -> Result<Option<f64>, ExportError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ExportError::InvalidField {
            row,
            column,
            message: format!("expected decimal number, found '{value}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(country: &str, day: u32, cfr: Option<f64>, ma: Option<f64>) -> DerivedRecord {
        DerivedRecord {
            daily: DailyRecord {
                country: country.to_string(),
                iso_code: country[..3].to_uppercase(),
                continent: Continent::NorthAmerica,
                date: NaiveDate::from_ymd_opt(2021, 7, day).unwrap(),
                total_cases: 12_345,
                new_cases: 67,
                total_deaths: 890,
                new_deaths: 2,
                hosp_patients: 8,
                icu_patients: 3,
                total_vaccinations: 1_000_000,
                people_vaccinated: 900_000,
                people_fully_vaccinated: 100_000,
                population: 38_000_000,
            },
            case_fatality_rate: cfr,
            vaccination_rate: Some(0.263_157_894_736_842),
            hospitalization_rate: Some(11.940_298_507_462_687),
            icu_rate: Some(37.5),
            new_cases_ma: ma,
            new_deaths_ma: ma.map(|v| v / 10.0),
        }
    }

    #[test]
    fn roundtrip_preserves_rows() {
        let records = vec![
            record("Canada", 1, Some(7.207_776_427_703_524), Some(61.5)),
            record("Canada", 2, None, None),
        ];
        let mut buffer = Vec::new();
        write_csv(&records, &mut buffer).unwrap();
        let parsed = read_csv(buffer.as_slice()).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn header_row_is_stable() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "iso_code,continent,location,date,total_cases,new_cases,total_deaths,new_deaths,\
             hosp_patients,icu_patients,total_vaccinations,people_vaccinated,\
             people_fully_vaccinated,population,case_fatality_rate,vaccination_rate,\
             hospitalization_rate,icu_rate,new_cases_ma,new_deaths_ma"
        );
    }

    #[test]
    fn dates_are_iso_formatted() {
        let mut buffer = Vec::new();
        write_csv(&[record("Canada", 9, None, None)], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("2021-07-09"));
    }

    #[test]
    fn missing_rates_are_empty_fields() {
        let mut buffer = Vec::new();
        write_csv(&[record("Canada", 1, None, None)], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let data_line = text.lines().nth(1).unwrap();
        // case_fatality_rate and both moving averages are absent.
        assert!(data_line.contains(",,"));
        assert!(data_line.ends_with(",,"));
    }

    #[test]
    fn rejects_unknown_header() {
        let input = "iso,continent\nUSA,EUROPE\n";
        assert!(matches!(
            read_csv(input.as_bytes()),
            Err(ExportError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn names_row_and_column_on_bad_field() {
        let mut buffer = Vec::new();
        write_csv(&[record("Canada", 1, None, None)], &mut buffer).unwrap();
        let text = String::from_utf8(buffer)
            .unwrap()
            .replace("12345", "not-a-number");
        let err = read_csv(text.as_bytes()).unwrap_err();
        match err {
            ExportError::InvalidField { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "total_cases");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let records = vec![record("Canada", 1, Some(2.5), None)];
        write_csv_path(&records, &path).unwrap();
        assert_eq!(read_csv_path(&path).unwrap(), records);
    }
}
