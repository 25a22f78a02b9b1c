//! Transposition of the ACS CVAP special tabulation.
//!
//! The block-group file publishes one row per (block group, line) pair, with
//! 13 lines per block group, one per racial/ethnic category. This module
//! turns it into one row per block group with one column per kept line,
//! named `<line>_<year>`.

use std::collections::BTreeMap;

use polars::prelude::*;

use crate::{
    engine::Diagnostic,
    error::{EngineError, Result},
    types::{GeoId, GeoType},
};

/// Number of lines describing one unit.
pub const LINES_PER_UNIT: usize = 13;

/// Line 2 ("Not Hispanic or Latino") is dropped.
const DROPPED_LINE: u8 = 2;

/// First line summed into the detailed total.
const FIRST_DETAIL_LINE: u8 = 3;

/// Lines kept in the transposed table, with their codebook descriptions.
pub const KEPT_LINES: [(u8, &str); 12] = [
    (1, "Total CVAP"),
    (3, "American Indian or Alaska Native Alone"),
    (4, "Asian Alone"),
    (5, "Black or African American Alone"),
    (6, "Native Hawaiian or Other Pacific Islander Alone"),
    (7, "White Alone"),
    (8, "American Indian or Alaska Native and White"),
    (9, "Asian and White"),
    (10, "Black or African American and White"),
    (11, "American Indian or Alaska Native and Black or African American"),
    (12, "Remainder of Two or More Race Responses"),
    (13, "Hispanic or Latino"),
];

/// Column name for a line in a given year, e.g. `3_2019`.
pub fn column_code(line: u8, year: u16) -> String {
    format!("{line}_{year}")
}

/// All kept column names for a year, total first.
pub fn column_codes(year: u16) -> Vec<String> {
    KEPT_LINES.iter().map(|&(line, _)| column_code(line, year)).collect()
}

/// True for a `<line>_<year>` column of any year, e.g. `13_2018`.
pub fn is_cvap_code(column: &str) -> bool {
    let Some((line, year)) = column.split_once('_') else { return false };
    line.parse::<u8>().is_ok_and(|line| (1..=LINES_PER_UNIT as u8).contains(&line))
        && year.len() == 4
        && year.bytes().all(|b| b.is_ascii_digit())
}

/// A transposed CVAP table and the totals that were normalized on the way.
#[derive(Debug, Clone)]
pub struct CvapTable {
    /// `geoid` followed by one column per kept line.
    pub data: DataFrame,
    pub normalized: Vec<Diagnostic>,
}

/// Find a column by case-insensitive name.
fn find_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.get_columns().iter().find(|column| column.name().eq_ignore_ascii_case(name))
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    find_column(df, name).ok_or_else(|| EngineError::MissingColumn {
        set: "CVAP table".into(),
        column: name.into(),
    })
}

/// Transpose the raw CVAP block-group table for one state.
///
/// Rows are grouped by `geoid` (rows outside `15000US<state>` are skipped)
/// and placed by `lnnumber`; without a `lnnumber` column, lines are numbered by
/// their order of appearance within each unit. Every unit must have all 13
/// lines.
///
/// If the sum of lines 3 through 13 differs from the reported total on line 1
/// and is non-zero, the total is replaced by the sum and the change is
/// recorded in `normalized`.
pub fn transpose_cvap(raw: &DataFrame, state: &str, year: u16) -> Result<CvapTable> {
    let prefix = format!("15000US{state:0>2}");

    let geoids = require_column(raw, "geoid")?.cast(&DataType::String)?;
    let estimates = require_column(raw, "cvap_est")?.cast(&DataType::Float64)?;
    let line_numbers = find_column(raw, "lnnumber")
        .map(|column| column.cast(&DataType::Int64))
        .transpose()?;

    let geoids = geoids.str()?;
    let estimates = estimates.f64()?;
    let line_numbers = line_numbers.as_ref().map(|column| column.i64()).transpose()?;

    let mut units: BTreeMap<String, [Option<f64>; LINES_PER_UNIT]> = BTreeMap::new();
    for row in 0..raw.height() {
        let Some(geoid) = geoids.get(row) else { continue };
        if !geoid.starts_with(&prefix) { continue }

        let id = GeoId::from_census_api(GeoType::Group, geoid).id().to_string();
        let lines = units.entry(id.clone()).or_insert([None; LINES_PER_UNIT]);

        let line = match line_numbers {
            Some(numbers) => numbers.get(row).unwrap_or(0),
            None => lines.iter().filter(|value| value.is_some()).count() as i64 + 1,
        };
        if !(1..=LINES_PER_UNIT as i64).contains(&line) {
            return Err(EngineError::MalformedTable(format!("{id}: line number {line} out of range")));
        }

        let slot = &mut lines[line as usize - 1];
        if slot.is_some() {
            return Err(EngineError::MalformedTable(format!("{id}: line {line} appears twice")));
        }
        *slot = Some(estimates.get(row).unwrap_or(0.0));
    }

    let mut ids = Vec::with_capacity(units.len());
    let mut columns = vec![Vec::with_capacity(units.len()); KEPT_LINES.len()];
    let mut normalized = Vec::new();

    for (id, lines) in units {
        let mut values = [0.0; LINES_PER_UNIT];
        for (n, value) in lines.iter().enumerate() {
            values[n] = value.ok_or_else(|| EngineError::MalformedTable(format!("{id}: line {} is missing", n + 1)))?;
        }

        let reported = values[0];
        let computed: f64 = values[FIRST_DETAIL_LINE as usize - 1..].iter().sum();
        if computed != reported && computed != 0.0 {
            values[0] = computed;
            normalized.push(Diagnostic::TotalNormalized {
                geo_id: GeoId::new(GeoType::Group, &id),
                reported,
                computed,
            });
        }

        for (column, &(line, _)) in columns.iter_mut().zip(KEPT_LINES.iter()) {
            debug_assert_ne!(line, DROPPED_LINE);
            column.push(values[line as usize - 1]);
        }
        ids.push(id);
    }

    let data = DataFrame::new(
        std::iter::once(Column::new("geoid".into(), ids))
            .chain(column_codes(year).into_iter().zip(columns)
                .map(|(name, values)| Column::new(name.into(), values)))
            .collect()
    )?;

    Ok(CvapTable { data, normalized })
}
