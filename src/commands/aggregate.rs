use anyhow::Result;
use tracing::info;

use crate::{
    census::is_cvap_code,
    cli::AggregateArgs,
    commands::{align_crs, assignment, load_set, prepare_output, repair, value_columns},
    config::JobConfig,
    engine::{aggregate, AggregateReport},
    layer::GeometrySet,
};

/// Sum source columns into the target units and write the target.
pub fn run(job: &JobConfig, args: &AggregateArgs) -> Result<()> {
    let mut source = load_set(job, &args.source, args.source_level)?;
    let mut target = load_set(job, &args.target, args.target_level)?;
    align_crs(&target, &mut source)?;

    let report = aggregate_sets(job, args, &mut source, &mut target)?;
    report.log("aggregate", &job.tolerance());

    prepare_output(&args.output)?;
    target.to_geojson_file(&args.output, &job.id_property)?;
    info!("[aggregate] wrote {}", args.output.display());
    Ok(())
}

fn aggregate_sets(
    job: &JobConfig,
    args: &AggregateArgs,
    source: &mut GeometrySet,
    target: &mut GeometrySet,
) -> Result<AggregateReport> {
    if !args.no_repair {
        repair(source);
        repair(target);
    }

    let mut columns = value_columns(source, &args.columns, &[]);
    if args.columns.is_empty() && !args.cvap {
        columns.retain(|column| !is_cvap_code(column));
    }

    let (assignment, nearest_filled) =
        assignment(source, target, args.by_geoid, args.fallback.unwrap_or(job.fallback))?;
    let report = aggregate(source, target, &assignment, &columns)?;
    Ok(AggregateReport { nearest_filled, ..report })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use geo::{polygon, MultiPolygon};

    use crate::{engine::Fallback, types::GeoType};
    use super::*;

    fn rect(x0: f64, x1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 1.0), (x: x0, y: 1.0), (x: x0, y: 0.0),
        ]])
    }

    fn args() -> AggregateArgs {
        AggregateArgs {
            source: PathBuf::from("blocks.geojson"),
            source_level: GeoType::Custom,
            target: PathBuf::from("wards.geojson"),
            target_level: GeoType::Custom,
            columns: Vec::new(),
            cvap: false,
            by_geoid: false,
            fallback: None,
            no_repair: false,
            output: PathBuf::from("out.geojson"),
        }
    }

    /// Blocks A = [0,1] and B = [1,2] inside ward W = [0,2]; C = [5,6] outside it.
    fn sets() -> (GeometrySet, GeometrySet) {
        let mut blocks = GeometrySet::new(
            "blocks", GeoType::Custom, vec!["A".into(), "B".into(), "C".into()],
            vec![rect(0.0, 1.0), rect(1.0, 2.0), rect(5.0, 6.0)], None,
        ).unwrap();
        blocks.set_column_f64("TOTPOP", vec![4.0, 6.0, 1.0]).unwrap();
        blocks.set_column_f64("1_2019", vec![2.0, 3.0, 0.0]).unwrap();

        let wards = GeometrySet::new("wards", GeoType::Custom, vec!["W".into()], vec![rect(0.0, 2.0)], None).unwrap();
        (blocks, wards)
    }

    #[test]
    fn cvap_columns_are_opt_in() {
        let (mut blocks, mut wards) = sets();
        aggregate_sets(&JobConfig::default(), &args(), &mut blocks, &mut wards).unwrap();
        assert_eq!(wards.column_f64("TOTPOP").unwrap(), vec![10.0]);
        assert!(!wards.has_column("1_2019"));

        let (mut blocks, mut wards) = sets();
        let args = AggregateArgs { cvap: true, ..args() };
        aggregate_sets(&JobConfig::default(), &args, &mut blocks, &mut wards).unwrap();
        assert_eq!(wards.column_f64("1_2019").unwrap(), vec![5.0]);
    }

    #[test]
    fn nearest_fill_reaches_the_report() {
        let (mut blocks, mut wards) = sets();
        let args = AggregateArgs { fallback: Some(Fallback::Nearest), ..args() };
        let report = aggregate_sets(&JobConfig::default(), &args, &mut blocks, &mut wards).unwrap();

        assert_eq!(wards.column_f64("TOTPOP").unwrap(), vec![11.0]);
        assert_eq!(report.nearest_filled.len(), 1);
        assert_eq!(report.nearest_filled[0].id(), "C");
    }
}
