//! Census-specific table preparation: ACS variables, the CVAP special
//! tabulation and its codebook, and the weight families used when prorating.

mod acs;
mod codebook;
mod cvap;
mod families;
mod variables;

pub use acs::{prepare_acs, AcsSchema, AcsTable};
pub use codebook::Codebook;
pub use cvap::{column_code, column_codes, is_cvap_code, transpose_cvap, CvapTable, KEPT_LINES, LINES_PER_UNIT};
pub use families::WeightFamilies;
pub use variables::variables;
