use anyhow::Result;
use tracing::info;

use crate::{cli::DescribeArgs, commands::{load_set, prepare_output}, config::JobConfig, io::csv::write_description};

/// Write the `name,type` listing of a geometry file's columns.
pub fn run(job: &JobConfig, args: &DescribeArgs) -> Result<()> {
    let set = load_set(job, &args.input, args.level)?;
    prepare_output(&args.output)?;
    write_description(&set, &job.id_property, &args.output)?;
    info!("[describe] {} columns of {} -> {}", set.describe(&job.id_property).len(), set.name(), args.output.display());
    Ok(())
}
