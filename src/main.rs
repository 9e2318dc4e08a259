//! Voxguard CLI - AI-generated voice detection
//!
//! Command-line interface for the Voxguard detector.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use voxguard::cli::{commands, Cli, Commands};
use voxguard::{DetectorConfig, VoiceDetector};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "voxguard=debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Voxguard v{}", env!("CARGO_PKG_VERSION"));

    let Some(cmd) = cli.command else {
        println!("Voxguard v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(path) => DetectorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => DetectorConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("applying environment overrides")?;

    // The backend must load before any command runs
    let detector = VoiceDetector::from_config(config).context("initializing inference backend")?;

    match cmd {
        Commands::Analyze {
            file,
            language,
            json,
        } => commands::analyze(&detector, &file, language, json)?,
        Commands::Scan { dir, json } => commands::scan(&detector, &dir, json)?,
        Commands::Calibrate { human, ai, json } => {
            commands::calibrate(&detector, &human, &ai, json)?
        }
    }

    Ok(())
}
