use clap::{Parser, Subcommand};
use commands::{
    coalesce::{run_coalesce, CoalesceArgs},
    envelope::{run_envelope, EnvelopeArgs},
};
use config::{Config, OutputFormat};
use logging::init_logging;

mod commands;
mod config;
mod logging;

#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    /// The output format [default: gml]
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// The log level or a filter directive such as `geoextent_core=debug`
    /// [default: warn]
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Coalesce(CoalesceArgs),
    Envelope(EnvelopeArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_args_with_fallback(cli.format, cli.log_level)?;
    init_logging(&config.log_level)?;

    match cli.command {
        Commands::Coalesce(args) => run_coalesce(args, &config),
        Commands::Envelope(args) => run_envelope(args, &config),
    }
}
