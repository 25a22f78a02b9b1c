//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter}};

use crate::layer::GeometrySet;

/// Write a DataFrame to a CSV file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

/// Write the `name,type` listing of a set's columns, the id listed as `id_property`.
pub(crate) fn write_description(set: &GeometrySet, id_property: &str, path: &Path) -> Result<()> {
    let (names, types): (Vec<String>, Vec<String>) = set.describe(id_property).into_iter().unzip();
    let mut df = DataFrame::new(vec![
        Column::new("name".into(), names),
        Column::new("type".into(), types),
    ])?;
    write_csv(&mut df, path)
}
