#![doc = "Apportion public API"]
mod census;
mod engine;
mod error;
mod io;
mod layer;
mod proj;
mod types;

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

#[doc(inline)]
pub use types::{GeoId, GeoType};

#[doc(inline)]
pub use layer::GeometrySet;

#[doc(inline)]
pub use error::{EngineError, Result};

#[doc(inline)]
pub use engine::{
    aggregate, aggregate_spatial, assign, assign_by_geo_id, assign_with_fallback, dissolve,
    log_diagnostics, prorate, prorate_spatial, unassigned_ids, AggregateReport, ColumnBalance,
    Diagnostic, Fallback, ProrateReport, Tolerance,
};

#[doc(inline)]
pub use census::{
    column_code, column_codes, is_cvap_code, prepare_acs, transpose_cvap, variables, AcsSchema, AcsTable,
    Codebook, CvapTable, WeightFamilies, KEPT_LINES, LINES_PER_UNIT,
};

#[doc(inline)]
pub use overlay::Assignment;
