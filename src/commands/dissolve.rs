use anyhow::Result;
use tracing::info;

use crate::{cli::DissolveArgs, commands::{load_set, prepare_output}, config::JobConfig, engine::dissolve};

pub fn run(job: &JobConfig, args: &DissolveArgs) -> Result<()> {
    let source = load_set(job, &args.input, args.level)?;
    let name = format!("{}-by-{}", source.name(), args.by);

    let (dissolved, report) = dissolve(&source, &args.by, &args.columns, &name)?;
    info!("[dissolve] {} units -> {} by {}", source.len(), dissolved.len(), args.by);
    if let Some(report) = report {
        report.log("dissolve", &job.tolerance());
    }

    prepare_output(&args.output)?;
    dissolved.to_geojson_file(&args.output, &job.id_property)?;
    info!("[dissolve] wrote {}", args.output.display());
    Ok(())
}
