//! vidqa CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidqa::cli::{commands, Cli, Commands};
use vidqa::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidqa={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Transcript {
            input,
            lang,
            output,
            list,
        } => {
            commands::run_transcript(input, lang.as_deref(), output.clone(), *list, settings)
                .await?;
        }

        Commands::Ask {
            input,
            question,
            lang,
            model,
            k,
        } => {
            commands::run_ask(input, question, lang.as_deref(), model.clone(), *k, settings)
                .await?;
        }

        Commands::Chat { input, lang, model } => {
            commands::run_chat(input, lang.as_deref(), model.clone(), settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
