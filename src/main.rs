//! Tubechat CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubechat::cli::{commands, log_level, Cli, Commands};
use tubechat::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = log_level(cli.verbose, &settings.general.log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubechat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Ingest { url, user } => {
            commands::run_ingest(url, *user, settings).await?;
        }

        Commands::List { user } => {
            commands::run_list(*user, settings)?;
        }

        Commands::Ask {
            question,
            user,
            video,
        } => {
            commands::run_ask(question, *user, video, settings).await?;
        }

        Commands::History { user, video } => {
            commands::run_history(*user, video, settings)?;
        }

        Commands::User { action } => {
            commands::run_user(action, settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(config_path, &settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
