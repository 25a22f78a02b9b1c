//! Spatial overlay primitives: an R-tree indexed geometry store, maximal-overlap
//! assignment between two layers, and zero-width repair / grouped union.

mod assign;
mod bbox;
mod geometries;
mod repair;

pub use assign::{assign, check_crs, AssignError, Assignment, TIE_TOLERANCE};
pub use geometries::Geometries;
pub use repair::{repair, union_all, union_groups};
