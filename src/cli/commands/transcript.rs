//! Transcript command implementation.

use super::load_input;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{list_languages, YtDlpSource};
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(
    input: &str,
    lang: Option<&str>,
    output: Option<String>,
    list: bool,
    settings: Settings,
) -> Result<()> {
    if list {
        return print_languages(input, &settings).await;
    }

    let lang = lang.unwrap_or(&settings.transcript.language);
    let text = load_input(input, lang, &settings).await?;

    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, &text)?;
            Output::success(&format!("Transcript written to {}", path.display()));
        }
        None => println!("{}", text),
    }

    Ok(())
}

async fn print_languages(input: &str, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::FetchTranscript, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let source = YtDlpSource::new(&settings.transcript)?;
    let spinner = Output::spinner("Listing transcripts...");
    let tracks = list_languages(&source, input).await;
    spinner.finish_and_clear();

    let tracks = tracks?;
    Output::header("Available transcripts");
    for track in &tracks {
        let kind = if track.is_generated {
            "generated"
        } else {
            "manual"
        };
        Output::list_item(&format!(
            "{} ({}, {})",
            track.language, track.language_code, kind
        ));
    }

    Ok(())
}
