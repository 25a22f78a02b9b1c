use anyhow::{Context, Result};
use tracing::info;

use crate::{
    census::{transpose_cvap, Codebook},
    cli::CvapArgs,
    commands::prepare_output,
    config::JobConfig,
    engine::log_diagnostics,
    io::{csv::{read_csv_lossy, write_csv}, json::{read_json, write_json}},
};

/// Transpose the CVAP tabulation for each requested year and merge the
/// line descriptions into the codebook.
pub fn run(job: &JobConfig, args: &CvapArgs) -> Result<()> {
    let years = if args.years.is_empty() { vec![job.year] } else { args.years.clone() };

    let codebook_path = job.demo_root.join(&args.codebook);
    let mut codebook = if codebook_path.exists() {
        read_json::<Codebook>(&codebook_path)?
    } else {
        Codebook::new()
    };

    for year in years {
        let input = job.demo_root.join(args.input.replace("{year}", &year.to_string()));
        let output = job.demo_root.join(args.output.replace("{year}", &year.to_string()));

        let raw = read_csv_lossy(&input)?;
        let mut table = transpose_cvap(&raw, &job.state, year)
            .with_context(|| format!("[cvap] Failed to transpose {}", input.display()))?;
        log_diagnostics("cvap", &table.normalized);

        prepare_output(&output)?;
        write_csv(&mut table.data, &output)?;
        info!(
            "[cvap] {year}: {} block groups, {} totals normalized -> {}",
            table.data.height(), table.normalized.len(), output.display(),
        );

        codebook.insert_cvap_year(year);
    }

    prepare_output(&codebook_path)?;
    write_json(&codebook_path, &codebook)?;
    info!("[cvap] codebook -> {}", codebook_path.display());
    Ok(())
}
