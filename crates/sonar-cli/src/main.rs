mod commands;
mod input;
mod offsets;
mod presenter;
mod shutdown;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sonar_core::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sonar")]
#[command(about = "Actor radar for Unreal Engine games")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Attach to this process id instead of searching by name
    #[arg(long, global = true)]
    pid: Option<u32>,

    /// Signature file used when offsets have to be scanned
    #[arg(long, global = true)]
    signatures: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    radar: RadarArgs,
}

#[derive(clap::Args)]
struct RadarArgs {
    /// Offsets file (JSON); scanned from the module when missing or stale
    #[arg(short, long)]
    offsets: Option<PathBuf>,

    /// Write scanned offsets back to the offsets file
    #[arg(long, requires = "offsets")]
    save_offsets: bool,

    /// Override the configured frame rate
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the target module for offsets and print them
    Scan {
        /// Write the result to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose { "sonar=debug" } else { "sonar=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let mut config = load_config(&args.config);
    if let Some(fps) = args.radar.fps {
        config.radar.fps = fps;
    }
    config.validate().context("Invalid configuration")?;

    let target = commands::Target {
        pid: args.pid,
        signatures: args.signatures,
    };

    match args.command {
        Some(Command::Scan { output }) => commands::scan::run(&config, &target, output.as_deref()),
        None => commands::radar::run(
            &config,
            &target,
            args.radar.offsets.as_deref(),
            args.radar.save_offsets,
        ),
    }
}

/// Load the config file, falling back to defaults when it is missing or
/// unreadable.
fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) if e.is_not_found() => {
            info!("Config file {} not found, using defaults", path.display());
            Config::default()
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    }
}
