use anyhow::Result;
use clap::Parser;

use apportion::{cli::Cli, commands, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    commands::run(&cli)
}
