use ahash::AHashSet;
use polars::prelude::*;

use crate::error::{EngineError, Result};
use super::GeometrySet;

/// True for the integer and floating-point dtypes.
fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
            | DataType::Float32 | DataType::Float64
    )
}

fn is_integer(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
            | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
    )
}

/// Convert `id_col` to a String column, restoring leading zeros lost to
/// numeric parsing when `width` is known.
fn normalize_id_column(mut df: DataFrame, id_col: &str, width: usize) -> Result<DataFrame> {
    /// Left-pad purely numeric ids to `width`.
    fn pad(id: &str, width: usize) -> String {
        if id.len() < width && id.bytes().all(|b| b.is_ascii_digit()) {
            format!("{id:0>width$}")
        } else {
            id.to_string()
        }
    }

    let column = df.column(id_col).map_err(|_| EngineError::MissingColumn {
        set: "joined table".into(),
        column: id_col.into(),
    })?;

    let ids: StringChunked = match column.dtype() {
        DataType::String => column.str()?.into_iter()
            .map(|opt| opt.map(|id| pad(id.trim(), width)))
            .collect(),
        dtype if is_integer(dtype) => column.cast(&DataType::Int64)?.i64()?.into_iter()
            .map(|opt| opt.map(|id| pad(&id.to_string(), width)))
            .collect(),
        dtype => return Err(EngineError::MalformedTable(
            format!("id column {id_col:?} has unsupported type {dtype}")
        )),
    };

    df.replace(id_col, ids.with_name(id_col.into()))?;
    Ok(df)
}

impl GeometrySet {
    fn missing(&self, column: &str) -> EngineError {
        EngineError::MissingColumn { set: self.name.clone(), column: column.to_string() }
    }

    /// Width of this set's GEOIDs, or 0 if they are not all the same length.
    pub(crate) fn id_width(&self) -> usize {
        let mut lengths = self.geo_ids.iter().map(|geo_id| geo_id.id().len());
        let Some(first) = lengths.next() else { return 0 };
        if lengths.all(|len| len == first) { first } else { 0 }
    }

    /// Check whether an attribute column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.data.column(name).is_ok()
    }

    /// Names of all attribute columns (excluding the GEOID column).
    pub fn column_names(&self) -> Vec<String> {
        self.data.get_column_names().into_iter()
            .map(|name| name.to_string())
            .filter(|name| name != Self::ID_COLUMN)
            .collect()
    }

    /// Names of all numeric attribute columns.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.data.get_columns().iter()
            .filter(|column| column.name().as_str() != Self::ID_COLUMN && is_numeric(column.dtype()))
            .map(|column| column.name().to_string())
            .collect()
    }

    /// Read a numeric column as `f64`, one value per unit. Missing values read as 0.
    pub fn column_f64(&self, name: &str) -> Result<Vec<f64>> {
        let column = self.data.column(name).map_err(|_| self.missing(name))?;
        if !is_numeric(column.dtype()) {
            return Err(EngineError::MalformedTable(
                format!("column {name:?} of {} is not numeric ({})", self.name, column.dtype())
            ));
        }
        Ok(column.cast(&DataType::Float64)?.f64()?.into_iter()
            .map(|value| value.unwrap_or(0.0))
            .collect())
    }

    /// Sum of a numeric column.
    pub fn column_sum(&self, name: &str) -> Result<f64> {
        Ok(self.column_f64(name)?.iter().sum())
    }

    /// Add or overwrite a numeric column.
    pub fn set_column_f64(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if name == Self::ID_COLUMN {
            return Err(EngineError::MalformedTable(format!("cannot overwrite the {name:?} column")));
        }
        if values.len() != self.len() {
            return Err(EngineError::LengthMismatch {
                what: format!("column {name:?}"),
                expected: self.len(),
                found: values.len(),
            });
        }
        self.data.with_column(Column::new(name.into(), values))?;
        Ok(())
    }

    /// Keep only the listed attribute columns (plus the GEOID column), in the given order.
    pub fn retain_columns(&mut self, keep: &[String]) -> Result<()> {
        if let Some(name) = keep.iter().find(|name| !self.has_column(name)) {
            return Err(self.missing(name));
        }
        let selection = std::iter::once(Self::ID_COLUMN.to_string())
            .chain(keep.iter().filter(|name| name.as_str() != Self::ID_COLUMN).cloned())
            .collect::<Vec<_>>();
        self.data = self.data.select(selection)?;
        Ok(())
    }

    /// Left-join `df` onto this set's units by GEOID. Columns already present
    /// are replaced; units absent from `df` get nulls. Returns how many units
    /// found a matching row.
    pub fn merge_data(&mut self, df: DataFrame, id_col: &str) -> Result<usize> {
        let df = normalize_id_column(df, id_col, self.id_width())?;

        let mut seen = AHashSet::with_capacity(df.height());
        let mut matched = 0;
        for id in df.column(id_col)?.str()?.into_iter().flatten() {
            if !seen.insert(id) {
                return Err(EngineError::DuplicateGeoId(id.to_string()));
            }
            if self.position_of(id).is_some() { matched += 1 }
        }

        for name in df.get_column_names().into_iter().filter(|name| name.as_str() != id_col) {
            if self.has_column(name.as_str()) && name.as_str() != Self::ID_COLUMN {
                self.data = self.data.drop(name.as_str())?;
            }
        }

        self.data = self.data
            .with_row_index("__row".into(), None)?
            .left_join(&df, [Self::ID_COLUMN], [id_col])?
            .sort(["__row"], SortMultipleOptions::default())?
            .drop("__row")?;

        Ok(matched)
    }

    /// Column names and dtypes, GEOID first and geometry last. The id column
    /// is listed under `id_name`, the property it is written to.
    pub fn describe(&self, id_name: &str) -> Vec<(String, String)> {
        self.data.get_columns().iter()
            .map(|column| match column.name().as_str() {
                Self::ID_COLUMN => (id_name.to_string(), column.dtype().to_string()),
                name => (name.to_string(), column.dtype().to_string()),
            })
            .chain(std::iter::once(("geometry".to_string(), "geometry".to_string())))
            .collect()
    }
}
