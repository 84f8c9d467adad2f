//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Run the config command.
///
/// `config_path` is the file given with `--config`, if any.
pub fn run_config(action: &ConfigAction, config_path: Option<PathBuf>, settings: Settings) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let rendered =
                toml::to_string_pretty(&settings).context("Failed to serialize config")?;
            if !config_path.exists() {
                Output::info("No config file yet, showing defaults.");
            }
            println!("{}", rendered);
        }
        ConfigAction::Edit => edit(&config_path, &settings)?,
        ConfigAction::Path => println!("{}", config_path.display()),
    }

    Ok(())
}

/// Open the config file in `$EDITOR`, writing the defaults first if needed,
/// and check that the edited file still parses.
fn edit(config_path: &Path, settings: &Settings) -> Result<()> {
    let config_path = config_path.to_path_buf();
    if !config_path.exists() {
        settings.save_to(&config_path)?;
        Output::info(&format!("Created default config at {}", config_path.display()));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    Output::info(&format!("Opening config in {}...", editor));

    match std::process::Command::new(&editor).arg(&config_path).status() {
        Ok(status) if status.success() => match Settings::load_from(Some(&config_path)) {
            Ok(_) => Output::success("Config saved."),
            Err(e) => Output::warning(&format!("Config saved but does not parse: {}", e)),
        },
        Ok(_) => Output::warning("Editor exited with non-zero status."),
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {}", config_path.display()));
        }
    }

    Ok(())
}
