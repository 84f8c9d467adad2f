//! CLI module for vidqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vidqa - Question answering over YouTube transcripts
///
/// Answers questions about a video using only what is said in its transcript.
#[derive(Parser, Debug)]
#[command(name = "vidqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDQA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the transcript of a YouTube video
    Transcript {
        /// YouTube URL or video ID
        input: String,

        /// Preferred transcript language code (default from config)
        #[arg(short, long)]
        lang: Option<String>,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// List the available transcript languages instead
        #[arg(long)]
        list: bool,
    },

    /// Ask a single question about a video or transcript file
    Ask {
        /// YouTube URL/ID, or path to a transcript text file
        input: String,

        /// The question to ask
        question: String,

        /// Preferred transcript language code
        #[arg(short, long)]
        lang: Option<String>,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,

        /// Number of transcript segments to retrieve
        #[arg(short)]
        k: Option<usize>,
    },

    /// Start an interactive question session about a video
    Chat {
        /// YouTube URL/ID, or path to a transcript text file
        input: String,

        /// Preferred transcript language code
        #[arg(short, long)]
        lang: Option<String>,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
