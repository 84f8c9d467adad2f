//! vidqa - Question answering over YouTube transcripts
//!
//! A local-first tool that answers questions about a video using only what is
//! said in its transcript.
//!
//! # Overview
//!
//! vidqa allows you to:
//! - Fetch the transcript of a YouTube video
//! - Split it into overlapping segments and embed them
//! - Ask questions answered only from the most relevant segments
//! - Serve the same over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and the grounding prompt
//! - `transcript` - Caption track listing and download
//! - `chunking` - Recursive transcript splitting
//! - `embedding` - Embedding generation
//! - `index` - In-memory similarity index
//! - `rag` - Retrieval and grounded answer generation
//! - `session` - Per-user session state
//! - `pipeline` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use vidqa::config::Settings;
//! use vidqa::pipeline::Pipeline;
//! use vidqa::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!     let mut session = Session::new();
//!
//!     let transcript = std::fs::read_to_string("transcript.txt")?;
//!     let loaded = pipeline
//!         .load_transcript(&mut session, &transcript, settings.chunking_config()?)
//!         .await;
//!     println!("Indexed {} segments", loaded.segments);
//!
//!     let asked = pipeline.ask(&mut session, "What is the video about?").await;
//!     println!("{}", asked.answer.unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod session;
pub mod transcript;

#[cfg(test)]
mod testing;

pub use error::{Result, VidqaError};
