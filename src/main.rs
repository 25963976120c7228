//! thryve - AI voice health check-ins and reports
//!
//! Entry point for the thryve CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thryve::cli::{Cli, Commands};
use thryve::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        thryve::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let settings = Settings::load()?;

    // Initialize logging
    let default_level = if cli.verbose {
        "debug".to_string()
    } else {
        settings.general.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let user_id = cli
        .user
        .unwrap_or_else(|| settings.general.user_id.clone());

    // Execute command
    match cli.command {
        Commands::Profile(profile_cmd) => {
            thryve::cli::commands::profile_command(&settings, &user_id, profile_cmd)?;
        }
        Commands::Call(call_cmd) => {
            thryve::cli::commands::call_command(&settings, &user_id, call_cmd).await?;
        }
        Commands::Report(report_cmd) => {
            thryve::cli::commands::report_command(&settings, &user_id, report_cmd)?;
        }
        Commands::Chat { message, clear } => {
            thryve::cli::commands::chat_command(&settings, &user_id, message, clear).await?;
        }
        Commands::Config(config_cmd) => {
            thryve::cli::commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
