use anyhow::Result;
use tracing::{info, warn};

use crate::{
    census::WeightFamilies,
    cli::ProrateArgs,
    commands::{align_crs, assignment, load_set, prepare_output, repair, value_columns},
    config::JobConfig,
    engine::{prorate, ProrateReport},
    layer::GeometrySet,
};

/// Prorate source columns onto the target units, population columns by the
/// population weight and voting-age columns by the voting-age weight.
pub fn run(job: &JobConfig, args: &ProrateArgs) -> Result<()> {
    let mut source = load_set(job, &args.source, args.source_level)?;
    let mut target = load_set(job, &args.target, args.target_level)?;
    align_crs(&target, &mut source)?;

    let tol = job.tolerance();
    for report in prorate_sets(job, args, &mut source, &mut target)? {
        report.log("prorate", &tol);
    }

    prepare_output(&args.output)?;
    target.to_geojson_file(&args.output, &job.id_property)?;
    info!("[prorate] wrote {}", args.output.display());
    Ok(())
}

/// One report per weight family with columns, population family first.
/// Every report is checked against the ceiling column, `--ceiling` or else
/// the population weight of the target.
fn prorate_sets(
    job: &JobConfig,
    args: &ProrateArgs,
    source: &mut GeometrySet,
    target: &mut GeometrySet,
) -> Result<Vec<ProrateReport>> {
    if !args.no_repair {
        repair(source);
        repair(target);
    }

    let weights = [args.pop_weight.as_str(), args.vap_weight.as_str()];
    let columns = value_columns(source, &args.columns, &weights);
    let families = WeightFamilies::partition(&columns, &args.vap_marker, &weights);
    info!(
        "[prorate] {} -> {}: {} columns by {}, {} by {}",
        source.name(), target.name(),
        families.population.len(), args.pop_weight,
        families.voting_age.len(), args.vap_weight,
    );

    let (assignment, mut nearest_filled) =
        assignment(target, source, args.by_geoid, args.fallback.unwrap_or(job.fallback))?;

    let ceiling = args.ceiling.as_deref().unwrap_or(&args.pop_weight);
    let check_ceiling = args.ceiling.is_some() || target.has_column(ceiling);
    if !check_ceiling {
        warn!("[prorate] {} has no {ceiling} column; ceiling not checked", target.name());
    }

    let mut reports = Vec::new();
    for (weight, family) in [(&args.pop_weight, &families.population), (&args.vap_weight, &families.voting_age)] {
        if family.is_empty() { continue }

        let mut report = prorate(target, source, &assignment, weight, weight, family)?;
        report.nearest_filled = std::mem::take(&mut nearest_filled);
        if check_ceiling {
            report.check_ceiling(target, ceiling)?;
        }
        reports.push(report);
    }
    Ok(reports)
}
