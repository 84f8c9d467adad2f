//! Ask command implementation.

use super::load_input;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::rag::ERROR_PREFIX;
use crate::session::Session;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    input: &str,
    question: &str,
    lang: Option<&str>,
    model: Option<String>,
    k: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Answer, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.llm.model = model;
    }
    if let Some(k) = k {
        settings.retrieval.k = k;
    }

    let lang = lang.unwrap_or(&settings.transcript.language).to_string();
    let transcript = load_input(input, &lang, &settings).await?;

    let pipeline = Pipeline::new(&settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner("Indexing transcript...");
    let loaded = pipeline
        .load_transcript(&mut session, &transcript, settings.chunking_config()?)
        .await;
    spinner.finish_and_clear();

    if let Some(error) = loaded.error {
        Output::error(&format!("Failed to process transcript: {}", error));
        anyhow::bail!(error);
    }

    let spinner = Output::spinner("Thinking...");
    let asked = pipeline.ask(&mut session, question).await;
    spinner.finish_and_clear();

    match (asked.answer, asked.error) {
        (Some(answer), _) => {
            Output::answer(&answer, answer.starts_with(ERROR_PREFIX));
            Ok(())
        }
        (None, Some(error)) => {
            Output::error(&error);
            anyhow::bail!(error)
        }
        (None, None) => Ok(()),
    }
}
