//! Transcript question answering pipeline.
//!
//! Ties chunking, embedding, indexing, retrieval and generation together.
//! The pipeline holds no per-transcript state; every operation works on a
//! caller-owned [`Session`].

use crate::chunking::{ChunkingConfig, RecursiveSplitter};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{with_timeout, Result, VidqaError};
use crate::index::SegmentIndex;
use crate::rag::{Answer, AnswerGenerator, ChatModel, Retriever};
use crate::session::{AskOutcome, LoadOutcome, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Trim a question, rejecting blank ones.
pub fn prepare_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(VidqaError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }
    Ok(question)
}

/// Answers questions about transcripts.
#[derive(Clone)]
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    generator: AnswerGenerator,
    embed_timeout: Duration,
}

impl Pipeline {
    /// Create a pipeline talking to the services named in `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(&settings.embedding)?);
        let model = Arc::new(ChatModel::new(&settings.llm)?);
        let generator = AnswerGenerator::new(model)
            .with_timeout(settings.llm.timeout())
            .with_min_grounding_overlap(settings.rag.min_grounding_overlap);

        info!(
            "Using {} for embeddings and {} for answers",
            settings.embedding.model, settings.llm.model
        );

        Ok(Self::with_components(embedder, generator, settings))
    }

    /// Create a pipeline with custom components.
    ///
    /// Retrieval `k` and the embedding timeout still come from `settings`.
    pub fn with_components(
        embedder: Arc<dyn Embedder>,
        generator: AnswerGenerator,
        settings: &Settings,
    ) -> Self {
        let embed_timeout = settings.embedding.timeout();
        let retriever = Retriever::new(embedder.clone())
            .with_k(settings.retrieval.k)
            .with_timeout(embed_timeout);

        Self {
            embedder,
            retriever,
            generator,
            embed_timeout,
        }
    }

    /// Split and embed a transcript into a fresh index.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn build_index(&self, transcript: &str, config: ChunkingConfig) -> Result<SegmentIndex> {
        let segments = RecursiveSplitter::new(config).split(transcript);
        if segments.is_empty() {
            return Err(VidqaError::NoContent);
        }

        info!("Embedding {} segments", segments.len());
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = with_timeout(
            "embedding service",
            self.embed_timeout,
            self.embedder.embed_batch(&texts),
        )
        .await?;

        SegmentIndex::build(segments, vectors)
    }

    /// Replace the session's transcript.
    ///
    /// On failure the session ends up in the error state without an index.
    pub async fn load_transcript(
        &self,
        session: &mut Session,
        transcript: &str,
        config: ChunkingConfig,
    ) -> LoadOutcome {
        let generation = session.begin_build();
        let result = self.build_index(transcript, config).await;
        if let Err(e) = &result {
            warn!("Failed to load transcript: {}", e);
        }

        let outcome = session.finish_build(generation, result);
        if outcome.ready {
            info!("Session {} ready with {} segments", session.id(), outcome.segments);
        }
        outcome
    }

    /// Answer one question from an index. Failures become error answers.
    #[instrument(skip(self, index))]
    pub async fn answer(&self, index: &SegmentIndex, question: &str) -> Answer {
        match self.retriever.retrieve(question, index).await {
            Ok(context) => self.generator.answer(question, &context).await,
            Err(e) => {
                warn!("Retrieval failed: {}", e);
                Answer::from_error(&e)
            }
        }
    }

    /// Answer a question against the session's transcript.
    ///
    /// Only a ready session accepts questions. The session stays ready
    /// whatever happens to the individual question.
    pub async fn ask(&self, session: &mut Session, question: &str) -> AskOutcome {
        let index = match session.index() {
            Ok(index) => index,
            Err(e) => return AskOutcome::rejected(e.to_string()),
        };

        let question = match prepare_question(question) {
            Ok(question) => question,
            Err(e) => return AskOutcome::rejected(e.to_string()),
        };

        let answer = self.answer(&index, question).await;
        session.record(question, &answer);
        AskOutcome::answered(answer.text)
    }
}
