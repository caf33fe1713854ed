//! CSV ingest of typed death and population records.
//!
//! Source spreadsheets are assumed to have been flattened into one row per
//! `(period, category)` already. This module only maps columns onto the typed
//! input records:
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No modeling**: dates are anchored, nothing is interpolated here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{DeathObservation, PopulationObservation, quarter_end, week_midpoint};
use crate::error::AppError;

const CATEGORY_COLUMNS: &[&str] = &["category", "age_category", "age_group"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed records plus every rejected row.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load weekly death records.
///
/// Accepted columns:
/// - date: `week_midpoint`, or `week_end` (anchored to its midpoint)
/// - value: `daily_deaths`, or `weekly_deaths` (divided by 7)
/// - category: `category` / `age_category` / `age_group`
pub fn load_deaths(path: &Path) -> Result<Ingested<DeathObservation>, AppError> {
    let (headers, reader) = open_csv(path)?;
    let header_map = build_header_map(&headers);

    let date_col = if let Some(idx) = header_map.get("week_midpoint") {
        DateColumn::Midpoint(*idx)
    } else if let Some(idx) = header_map.get("week_end") {
        DateColumn::WeekEnd(*idx)
    } else {
        return Err(missing_columns(path, "week_midpoint or week_end"));
    };
    let value_col = if let Some(idx) = header_map.get("daily_deaths") {
        ValueColumn::Daily(*idx)
    } else if let Some(idx) = header_map.get("weekly_deaths") {
        ValueColumn::Weekly(*idx)
    } else {
        return Err(missing_columns(path, "daily_deaths or weekly_deaths"));
    };
    let category_col = find_any(&header_map, CATEGORY_COLUMNS)
        .ok_or_else(|| missing_columns(path, "category"))?;

    read_rows(reader, |record| {
        let date = match date_col {
            DateColumn::Midpoint(idx) => parse_date(record, idx, "week_midpoint")?,
            DateColumn::WeekEnd(idx) => week_midpoint(parse_date(record, idx, "week_end")?),
        };
        let daily_deaths = match value_col {
            ValueColumn::Daily(idx) => parse_number(record, idx, "daily_deaths")?,
            ValueColumn::Weekly(idx) => parse_number(record, idx, "weekly_deaths")? / 7.0,
        };
        if daily_deaths < 0.0 {
            return Err(format!("negative death count {daily_deaths}"));
        }
        Ok(DeathObservation {
            week_midpoint: date,
            category: parse_category(record, category_col)?,
            daily_deaths,
        })
    })
}

/// Load quarterly population records.
///
/// Accepted columns:
/// - date: `quarter_end`, or `year` + `quarter`
/// - value: `population` / `population_count`
/// - category: `category` / `age_category` / `age_group`
pub fn load_population(path: &Path) -> Result<Ingested<PopulationObservation>, AppError> {
    let (headers, reader) = open_csv(path)?;
    let header_map = build_header_map(&headers);

    let date_col = if let Some(idx) = header_map.get("quarter_end") {
        QuarterColumn::End(*idx)
    } else if let (Some(year), Some(quarter)) = (header_map.get("year"), header_map.get("quarter")) {
        QuarterColumn::YearQuarter(*year, *quarter)
    } else {
        return Err(missing_columns(path, "quarter_end or year+quarter"));
    };
    let value_col = find_any(&header_map, &["population", "population_count"])
        .ok_or_else(|| missing_columns(path, "population"))?;
    let category_col = find_any(&header_map, CATEGORY_COLUMNS)
        .ok_or_else(|| missing_columns(path, "category"))?;

    read_rows(reader, |record| {
        let date = match date_col {
            QuarterColumn::End(idx) => parse_date(record, idx, "quarter_end")?,
            QuarterColumn::YearQuarter(year_idx, quarter_idx) => {
                let year = parse_int(record, year_idx, "year")?;
                let quarter = parse_int(record, quarter_idx, "quarter")?;
                let year = i32::try_from(year).map_err(|_| format!("year {year} out of range"))?;
                let quarter = u32::try_from(quarter).map_err(|_| format!("quarter {quarter} out of range"))?;
                quarter_end(year, quarter).map_err(|e| e.to_string())?
            }
        };
        let population = parse_number(record, value_col, "population")?;
        if population < 0.0 {
            return Err(format!("negative population {population}"));
        }
        Ok(PopulationObservation {
            quarter_end: date,
            category: parse_category(record, category_col)?,
            population,
        })
    })
}

#[derive(Debug, Clone, Copy)]
enum DateColumn {
    Midpoint(usize),
    WeekEnd(usize),
}

#[derive(Debug, Clone, Copy)]
enum ValueColumn {
    Daily(usize),
    Weekly(usize),
}

#[derive(Debug, Clone, Copy)]
enum QuarterColumn {
    End(usize),
    YearQuarter(usize, usize),
}

fn open_csv(path: &Path) -> Result<(StringRecord, csv::Reader<File>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers in '{}': {e}", path.display())))?
        .clone();

    Ok((headers, reader))
}

fn read_rows<T>(
    mut reader: csv::Reader<File>,
    parse: impl Fn(&StringRecord) -> Result<T, String>,
) -> Result<Ingested<T>, AppError> {
    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let outcome = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse(&record));
        match outcome {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if records.is_empty() {
        return Err(AppError::new(3, "No valid rows remain after parsing."));
    }

    Ok(Ingested {
        records,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often start with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace([' ', '-'], "_")
}

fn find_any(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn missing_columns(path: &Path, what: &str) -> AppError {
    AppError::new(
        2,
        format!("CSV '{}' is missing required column(s): {what}", path.display()),
    )
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("missing value for '{name}'")),
    }
}

fn parse_date(record: &StringRecord, idx: usize, name: &str) -> Result<NaiveDate, String> {
    let raw = field(record, idx, name)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("invalid date '{raw}' for '{name}': {e}"))
}

fn parse_number(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = field(record, idx, name)?;
    let value: f64 = raw
        .replace(',', "")
        .parse()
        .map_err(|_| format!("invalid number '{raw}' for '{name}'"))?;
    if !value.is_finite() {
        return Err(format!("non-finite value '{raw}' for '{name}'"));
    }
    Ok(value)
}

fn parse_int(record: &StringRecord, idx: usize, name: &str) -> Result<i64, String> {
    let raw = field(record, idx, name)?;
    raw.parse()
        .map_err(|_| format!("invalid integer '{raw}' for '{name}'"))
}

fn parse_category(record: &StringRecord, idx: usize) -> Result<String, String> {
    field(record, idx, "category").map(str::to_string)
}
