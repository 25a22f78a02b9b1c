//! Reading and writing of geometry sets, attribute tables and codebooks,
//! organized by format.
//!
//! - `csv` - attribute tables and `name,type` column listings
//! - `geojson` - geometry sets with their attributes
//! - `json` - codebooks and job files

pub(crate) mod csv;
pub(crate) mod geojson;
pub(crate) mod json;
