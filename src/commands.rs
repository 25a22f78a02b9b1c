//! One module per subcommand. Each loads its inputs, runs the engine, logs
//! the report and writes its outputs.

pub mod acs;
pub mod adjoin;
pub mod aggregate;
pub mod cvap;
pub mod describe;
pub mod dissolve;
pub mod prorate;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use overlay::Assignment;
use tracing::{info, warn};

use crate::{
    cli::{Cli, Commands},
    config::JobConfig,
    engine::{assign_by_geo_id, assign_with_fallback, Fallback},
    layer::GeometrySet,
    types::{GeoId, GeoType},
};

/// Relative area change above which a repaired geometry counts as changed.
const REPAIR_TOLERANCE: f64 = 1e-9;

/// Dispatch the parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let job = JobConfig::load(cli)?;
    info!("[apportion] state={} year={}", job.state, job.year);

    match &cli.command {
        Commands::Adjoin(args) => adjoin::run(&job, args),
        Commands::Prorate(args) => prorate::run(&job, args),
        Commands::Aggregate(args) => aggregate::run(&job, args),
        Commands::Dissolve(args) => dissolve::run(&job, args),
        Commands::Cvap(args) => cvap::run(&job, args),
        Commands::Acs(args) => acs::run(&job, args),
        Commands::Describe(args) => describe::run(&job, args),
    }
}

/// Load a geometry file resolved against the job's geometry root, naming the
/// set after the file stem.
fn load_set(job: &JobConfig, path: &Path, ty: GeoType) -> Result<GeometrySet> {
    let path = job.geo_path(path);
    let name = path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| ty.to_string());

    let set = GeometrySet::from_geojson_file(&path, &name, ty, &job.id_property)?;
    info!("[load] {} units from {}", set.len(), path.display());
    Ok(set)
}

/// Bring `other` into the CRS of `set` when both are known and differ.
fn align_crs(set: &GeometrySet, other: &mut GeometrySet) -> Result<()> {
    if let (Some(to), Some(from)) = (set.epsg(), other.epsg()) {
        if to != from {
            info!("[align] reprojecting {} from EPSG:{from} to EPSG:{to}", other.name());
            other.to_crs(to)
                .with_context(|| format!("[align] Failed to reproject {}", other.name()))?;
        }
    }
    Ok(())
}

/// Repair the geometries of `set` before any overlay. Returns how many changed.
fn repair(set: &mut GeometrySet) -> usize {
    let changed = set.repair_geometries(REPAIR_TOLERANCE);
    if changed > 0 {
        warn!("[repair] {changed} of {} geometries of {} were invalid and changed area", set.len(), set.name());
    } else {
        info!("[repair] {} geometries of {} unchanged", set.len(), set.name());
    }
    changed
}

/// Assign `fine` to `coarse`, by GEOID prefix or by overlap. Also returns the
/// fine units placed by the nearest-centroid fallback.
fn assignment(fine: &GeometrySet, coarse: &GeometrySet, by_geoid: bool, fallback: Fallback) -> Result<(Assignment, Vec<GeoId>)> {
    if by_geoid {
        return Ok((assign_by_geo_id(fine, coarse)?, Vec::new()));
    }
    Ok(assign_with_fallback(fine, coarse, fallback)?)
}

/// `requested` if given, otherwise every numeric column of `set` not in `exclude`.
fn value_columns(set: &GeometrySet, requested: &[String], exclude: &[&str]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    set.numeric_columns().into_iter()
        .filter(|column| !exclude.contains(&column.as_str()))
        .collect()
}

/// Make sure the parent directory of an output exists.
fn prepare_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("[output] Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
