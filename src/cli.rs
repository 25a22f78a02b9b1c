use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::{engine::Fallback, types::GeoType};

/// Move census data between geographic levels (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "apportion", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON job file with defaults for the options below
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// State FIPS code, e.g. 27
    #[arg(long, global = true)]
    pub state: Option<String>,

    /// Data year, e.g. 2019
    #[arg(long, global = true)]
    pub year: Option<u16>,

    /// Directory for relative geometry paths
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub geo_root: Option<PathBuf>,

    /// Directory for relative table paths
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub demo_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Join a CSV table onto a geometry file by GEOID
    Adjoin(AdjoinArgs),

    /// Distribute coarse-level data down to a finer level
    Prorate(ProrateArgs),

    /// Sum fine-level data up to a coarser level
    Aggregate(AggregateArgs),

    /// Merge units sharing an attribute value into one unit each
    Dissolve(DissolveArgs),

    /// Transpose the CVAP block-group special tabulation
    Cvap(CvapArgs),

    /// Prepare a block-group ACS table from raw census API columns
    Acs(AcsArgs),

    /// List a geometry file's columns and types as CSV
    Describe(DescribeArgs),
}

#[derive(Args, Debug)]
pub struct AdjoinArgs {
    /// Geometry file (GeoJSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub geometry: PathBuf,

    /// Table to join (CSV)
    #[arg(value_hint = ValueHint::FilePath)]
    pub table: PathBuf,

    /// Level of the geometry units
    #[arg(long, default_value = "group")]
    pub level: GeoType,

    /// GEOID column of the table, if not the job's id property
    #[arg(long)]
    pub table_id: Option<String>,

    /// Output geometry file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProrateArgs {
    /// Coarse geometry file carrying the data
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub source: PathBuf,

    #[arg(long, default_value = "group")]
    pub source_level: GeoType,

    /// Fine geometry file carrying the weights
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub target: PathBuf,

    #[arg(long, default_value = "block")]
    pub target_level: GeoType,

    /// Population weight column, present at both levels
    #[arg(long, default_value = "TOTPOP")]
    pub pop_weight: String,

    /// Voting-age weight column, present at both levels
    #[arg(long, default_value = "VAP")]
    pub vap_weight: String,

    /// Columns to prorate (default: every numeric source column except the weights)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Columns containing this text are weighted by the voting-age weight
    #[arg(long, default_value = "VAP")]
    pub vap_marker: String,

    /// Warn when a prorated column sums above this column of the target
    /// (default: the population weight)
    #[arg(long)]
    pub ceiling: Option<String>,

    /// Assign by GEOID prefix instead of by overlap (nested census levels only)
    #[arg(long)]
    pub by_geoid: bool,

    /// Override the job's handling of units with no overlap
    #[arg(long, value_enum)]
    pub fallback: Option<Fallback>,

    /// Skip the zero-width repair of both inputs
    #[arg(long)]
    pub no_repair: bool,

    /// Output geometry file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Fine geometry file carrying the data
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub source: PathBuf,

    #[arg(long, default_value = "block")]
    pub source_level: GeoType,

    /// Coarse geometry file to sum into
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub target: PathBuf,

    #[arg(long, default_value = "custom")]
    pub target_level: GeoType,

    /// Columns to sum (default: every numeric source column except CVAP line codes)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Also sum CVAP line columns (`<line>_<year>`) when no columns are listed
    #[arg(long)]
    pub cvap: bool,

    #[arg(long)]
    pub by_geoid: bool,

    #[arg(long, value_enum)]
    pub fallback: Option<Fallback>,

    /// Skip the zero-width repair of both inputs
    #[arg(long)]
    pub no_repair: bool,

    /// Output geometry file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct DissolveArgs {
    /// Geometry file to dissolve
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    #[arg(long, default_value = "block")]
    pub level: GeoType,

    /// Column whose values name the merged units, e.g. CONGDIST
    #[arg(long)]
    pub by: String,

    /// Columns to sum into the merged units
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Output geometry file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct CvapArgs {
    /// Years to transpose (default: the job year)
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<u16>,

    /// Raw table; `{year}` is replaced by each year
    #[arg(long, default_value = "acs-cvap-{year}/BlockGr.csv")]
    pub input: String,

    /// Output table; `{year}` is replaced by each year
    #[arg(long, default_value = "acs-cvap-transposed/bg-cvaps-t-{year}.csv")]
    pub output: String,

    /// Codebook to merge the year descriptions into
    #[arg(long, default_value = "cvap-codebook.json")]
    pub codebook: PathBuf,
}

#[derive(Args, Debug)]
pub struct AcsArgs {
    /// Raw census API table with a GEO_ID column
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output table
    #[arg(short, long, default_value = "acs-joined.csv", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Geometry file to describe
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    #[arg(long, default_value = "custom")]
    pub level: GeoType,

    /// Output `name,type` CSV
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
}
