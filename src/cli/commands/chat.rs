//! Interactive question session about one transcript.

use super::load_input;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::rag::ERROR_PREFIX;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(
    input: &str,
    lang: Option<&str>,
    model: Option<String>,
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

    println!("\n{}", style("vidqa chat").bold().cyan());
    println!(
        "{}\n",
        style(format!(
            "{} segments indexed. Type your questions, 'history' to review, or 'exit' to quit.",
            loaded.segments
        ))
        .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("history") {
            print_history(&session);
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let asked = pipeline.ask(&mut session, input).await;
        spinner.finish_and_clear();

        match (asked.answer, asked.error) {
            (Some(answer), _) if answer.starts_with(ERROR_PREFIX) => {
                Output::error(&answer);
            }
            (Some(answer), _) => {
                println!("\n{} {}\n", style("vidqa:").cyan().bold(), answer);
            }
            (None, Some(error)) => Output::error(&error),
            (None, None) => {}
        }
    }

    Ok(())
}

fn print_history(session: &Session) {
    if session.history().is_empty() {
        Output::info("No questions asked yet.");
        return;
    }

    Output::header("History");
    for (i, turn) in session.history().iter().enumerate() {
        Output::turn(i + 1, &turn.question, &turn.answer);
    }
    println!();
}
