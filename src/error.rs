use std::fmt;

use overlay::AssignError;
use polars::prelude::PolarsError;

use crate::types::GeoType;

/// Errors that reject an engine call outright. Data-quality anomalies are
/// never errors; they are collected as [`crate::Diagnostic`]s instead.
#[derive(Debug)]
pub enum EngineError {
    /// A weight or value column is absent from a set.
    MissingColumn { set: String, column: String },
    /// A weight column holds a negative value.
    NegativeWeight { column: String, geo_id: String, value: f64 },
    /// The two sets declare different coordinate reference systems.
    CrsMismatch { fine: u32, coarse: u32 },
    /// An input has a different number of rows than the set it belongs to.
    LengthMismatch { what: String, expected: usize, found: usize },
    /// Two units in one set share a GEOID.
    DuplicateGeoId(String),
    /// GEOID-prefix assignment between levels that do not nest.
    NotNested { fine: GeoType, coarse: GeoType },
    /// No projection is known for the requested EPSG code.
    UnsupportedCrs(u32),
    /// A coordinate transformation failed.
    Projection(String),
    /// A source table does not have the expected shape.
    MalformedTable(String),
    Polars(PolarsError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MissingColumn { set, column } =>
                write!(f, "column {column:?} is missing from {set}"),
            EngineError::NegativeWeight { column, geo_id, value } =>
                write!(f, "weight column {column:?} is negative ({value}) for {geo_id}"),
            EngineError::CrsMismatch { fine, coarse } =>
                write!(f, "coordinate reference systems differ: EPSG:{fine} vs EPSG:{coarse}"),
            EngineError::LengthMismatch { what, expected, found } =>
                write!(f, "{what} has {found} rows, expected {expected}"),
            EngineError::DuplicateGeoId(id) => write!(f, "duplicate GEOID {id}"),
            EngineError::NotNested { fine, coarse } =>
                write!(f, "{fine} units do not nest in {coarse} units by GEOID"),
            EngineError::UnsupportedCrs(epsg) => write!(f, "no projection known for EPSG:{epsg}"),
            EngineError::Projection(msg) => write!(f, "projection failed: {msg}"),
            EngineError::MalformedTable(msg) => write!(f, "malformed table: {msg}"),
            EngineError::Polars(e) => write!(f, "polars: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Polars(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PolarsError> for EngineError {
    fn from(e: PolarsError) -> Self {
        EngineError::Polars(e)
    }
}

impl From<AssignError> for EngineError {
    fn from(e: AssignError) -> Self {
        match e {
            AssignError::CrsMismatch { fine, coarse } => EngineError::CrsMismatch { fine, coarse },
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
