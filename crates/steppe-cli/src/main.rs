//! Steppe CLI - stepped frequency acoustic measurement from the command line.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use steppe_config::Settings;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "steppe")]
#[command(author, version, about = "Stepped frequency acoustic measurement", long_about = None)]
struct Cli {
    /// Settings file (defaults to the user settings file)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and look up audio devices
    Devices(commands::devices::DevicesArgs),

    /// Edit probe files
    Probe(commands::probe::ProbeArgs),

    /// Render sweeps and segments to WAV
    Generate(commands::generate::GenerateArgs),

    /// Play a probe or sweep while recording the response
    Measure(commands::measure::MeasureArgs),

    /// Compute the spectrum of a WAV file
    Analyze(commands::analyze::AnalyzeArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Probe(args) => commands::probe::run(args, &settings),
        Commands::Generate(args) => commands::generate::run(args, &settings),
        Commands::Measure(args) => commands::measure::run(args, &settings),
        Commands::Analyze(args) => commands::analyze::run(args, &settings),
    }
}
