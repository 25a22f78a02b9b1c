//! Proration, aggregation and dissolve between geometry sets.

mod aggregate;
mod assign;
mod dissolve;
mod prorate;
mod report;

pub use aggregate::{aggregate, aggregate_spatial};
pub use assign::{assign, assign_by_geo_id, assign_with_fallback, unassigned_ids, Fallback};
pub use dissolve::dissolve;
pub use prorate::{prorate, prorate_spatial};
pub use report::{log_diagnostics, AggregateReport, ColumnBalance, Diagnostic, ProrateReport, Tolerance};
