//! padlink CLI — run the controller relay daemon.

use clap::{Parser, Subcommand};
use padlink_daemon::{setup, Config, Daemon};
use padlink_input::InputSink;

#[derive(Parser)]
#[command(
    name = "padlink",
    about = "Relay remote controller input to a local Dolphin emulator",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay daemon.
    Run {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Print the default configuration as TOML.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = setup::load_config(config.as_deref())?;
            let daemon = Daemon::new(config.clone(), build_sink(&config));
            daemon.run().await?;
        }
        Commands::PrintConfig => {
            print!("{}", toml::to_string_pretty(&Config::default())?);
        }
    }

    Ok(())
}

#[cfg(all(feature = "linux", unix))]
fn build_sink(config: &Config) -> Box<dyn InputSink> {
    let pipe_dir = config
        .emulator
        .pipe_dir
        .clone()
        .unwrap_or_else(setup::default_pipe_dir);
    tracing::info!(pipe_dir = %pipe_dir.display(), "using Dolphin pipe input backend");
    Box::new(padlink_input::pipe::PipeSink::new(
        pipe_dir,
        config.daemon.max_clients,
    ))
}

#[cfg(not(all(feature = "linux", unix)))]
fn build_sink(_config: &Config) -> Box<dyn InputSink> {
    tracing::warn!("no input backend for this platform; frames will only be logged");
    Box::new(padlink_input::LogSink)
}
