//! Main entry point for the pmorph viewer

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pmorph::{App, SceneConfig};

#[derive(Parser, Debug)]
#[command(
    name = "pmorph",
    version,
    about = "Image-sampled particle fields that morph between shapes"
)]
struct Cli {
    /// JSON scene config; command line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shape image to cycle through (repeat for several)
    #[arg(short, long = "shape")]
    shapes: Vec<PathBuf>,

    /// Where the exit transition leads
    #[arg(long)]
    destination: Option<String>,

    /// Seed for explosion velocities
    #[arg(long)]
    seed: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if !cli.shapes.is_empty() {
        config = config.with_shapes(cli.shapes);
    }
    if let Some(destination) = cli.destination {
        config = config.with_destination(destination);
    }

    log::info!("shapes: {:?}", config.shapes);
    let mut app = App::new(config).context("preparing scene")?;
    if let Some(seed) = cli.seed {
        app = app.with_seed(seed);
    }
    app.run()?;
    Ok(())
}
