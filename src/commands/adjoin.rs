use anyhow::Result;
use tracing::{info, warn};

use crate::{cli::AdjoinArgs, commands::{load_set, prepare_output}, config::JobConfig};

/// Join a table onto a geometry file by GEOID and write the result.
pub fn run(job: &JobConfig, args: &AdjoinArgs) -> Result<()> {
    let mut set = load_set(job, &args.geometry, args.level)?;
    let table = job.demo_path(&args.table);
    let id_column = args.table_id.as_deref().unwrap_or(&job.id_property);

    let matched = set.adjoin_csv_file(&table, id_column)?;
    info!("[adjoin] {} -> {}: {matched} of {} units matched", table.display(), set.name(), set.len());
    if matched < set.len() {
        warn!("[adjoin] {} units of {} have no row in {}", set.len() - matched, set.name(), table.display());
    }

    prepare_output(&args.output)?;
    set.to_geojson_file(&args.output, &job.id_property)?;
    info!("[adjoin] wrote {}", args.output.display());
    Ok(())
}
