use anyhow::Result;
use tracing::{info, warn};

use crate::{
    census::{prepare_acs, AcsSchema},
    cli::AcsArgs,
    commands::prepare_output,
    config::JobConfig,
    io::csv::{read_csv_with_id, write_csv},
};

pub fn run(job: &JobConfig, args: &AcsArgs) -> Result<()> {
    let schema = AcsSchema::standard(job.year);
    let input = job.demo_path(&args.input);
    let raw = read_csv_with_id(&input, &schema.id_column)?;

    let mut table = prepare_acs(&raw, &schema)?;
    for column in &table.zero_columns {
        warn!(
            "[acs] {column} sums to zero; check that it is reported at the block group level"
        );
    }

    let output = job.demo_root.join(&args.output);
    prepare_output(&output)?;
    write_csv(&mut table.data, &output)?;
    info!("[acs] {} block groups -> {}", table.data.height(), output.display());
    Ok(())
}
