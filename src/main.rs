//! CLI entry point for planar shading correction

use biasplane::io::cli::{Cli, CommandRunner};
use biasplane::io::configuration::PathSettings;
use biasplane::io::logging::init_logging;
use clap::Parser;

fn main() -> biasplane::Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(&cli.log_level)?;
    let runner = CommandRunner::new(cli, PathSettings::from_env());
    runner.run()
}
