//! Command-line entry point for running the clustering simulation over a
//! directory of position snapshots.

use clap::Parser;
use layered_clustering_sim::config::Config;
use layered_clustering_sim::engine::SimulationEngine;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "layered-clustering-sim",
    about = "Simulate layered clustering over a Walker-lattice satellite constellation"
)]
struct Cli {
    /// Directory containing one position-snapshot file per simulation run.
    snapshots_dir: PathBuf,

    /// Optional TOML configuration file; omitted fields fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory results are written to, overriding the config value.
    #[arg(long)]
    output_dir: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, path = %path.display(), "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    if let Some(output_dir) = cli.output_dir {
        config.engine.output_dir = output_dir;
    }

    let engine = SimulationEngine::new(config);
    if let Err(err) = engine.run(&cli.snapshots_dir).await {
        error!(error = %err, "simulation run failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
