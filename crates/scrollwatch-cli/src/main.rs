use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrollwatch_core::AppConfig;

mod commands;
mod gesture;
mod runner;
mod scenario;

use commands::simulate::SimulateArgs;
use gesture::EasingType;

#[derive(Parser)]
#[command(name = "scrollwatch")]
#[command(author, version, about = "Replay and simulate scroll traces through a scroll notifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/scrollwatch/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file of timed scroll events
    Replay {
        /// Scenario TOML file
        scenario: PathBuf,
        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Run a synthesized, eased scroll gesture
    Simulate {
        /// Starting offset
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        /// Target offset
        #[arg(long)]
        to: f64,
        /// Gesture duration in milliseconds
        #[arg(long, default_value_t = 400)]
        duration_ms: u64,
        /// Easing curve of the gesture
        #[arg(long, value_enum, default_value_t = EasingType::Cubic)]
        easing: EasingType,
        /// Time between raw scroll events in milliseconds
        #[arg(long, default_value_t = 4)]
        event_interval_ms: u64,
        /// Print records as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Only print the configuration file path
        #[arg(long)]
        path: bool,
        /// Write the default configuration if the file doesn't exist
        #[arg(long, conflicts_with = "path")]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_from(&config_path)?;

    // Initialize logging; stdout carries the run output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Replay { scenario, json } => {
            commands::replay::run(&config, &scenario, json).await
        }
        Commands::Simulate {
            from,
            to,
            duration_ms,
            easing,
            event_interval_ms,
            json,
        } => {
            commands::simulate::run(
                &config,
                SimulateArgs {
                    from,
                    to,
                    duration_ms,
                    easing,
                    event_interval_ms,
                    json,
                },
            )
            .await
        }
        Commands::Config { path, init } => {
            commands::config::run(&config, &config_path, path, init)
        }
    }
}
