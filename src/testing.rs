//! Deterministic stand-ins for the embedding and language-model services.

use crate::chunking::Segment;
use crate::embedding::{Embedder, EmbeddingVector};
use crate::error::{Result, VidqaError};
use crate::index::SegmentIndex;
use crate::rag::{LanguageModel, ModelOutput};
use crate::transcript::{SourceError, Track, TranscriptSource};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const DIMENSIONS: usize = 1024;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "the", "of", "in", "on", "to", "from", "what", "did", "do", "does", "is",
    "was", "where", "how", "why", "who", "when", "which",
];

/// Lowercased content words of `text`.
pub(crate) fn keywords(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Bag-of-words embedder: one hashed dimension per content word.
pub(crate) struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Result<EmbeddingVector> {
        let words = keywords(text);
        if words.is_empty() {
            return Err(VidqaError::Embedding(format!("nothing to embed in {:?}", text)));
        }
        let mut vector = vec![0.0; DIMENSIONS];
        for word in words {
            vector[(fnv1a(&word) % DIMENSIONS as u64) as usize] += 1.0;
        }
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::vectorize(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|t| Self::vectorize(t)).collect()
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Embedder whose backend is always down.
pub(crate) struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<EmbeddingVector> {
        Err(VidqaError::Embedding("service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        Err(VidqaError::Embedding("service unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Index one segment per text.
pub(crate) async fn index_for(embedder: &dyn Embedder, texts: &[&str]) -> SegmentIndex {
    let segments: Vec<Segment> = texts
        .iter()
        .enumerate()
        .map(|(position, text)| Segment {
            text: text.to_string(),
            position,
            start: 0,
            end: text.len(),
        })
        .collect();
    let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let vectors = embedder.embed_batch(&owned).await.unwrap();
    SegmentIndex::build(segments, vectors).unwrap()
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &text[from..];
    let to = rest.find(end).unwrap_or(rest.len());
    rest[..to].trim()
}

/// Model that obeys the prompt: it answers with the context sentence sharing
/// the most words with the question.
pub(crate) struct ExtractiveModel;

#[async_trait]
impl LanguageModel for ExtractiveModel {
    async fn complete(&self, prompt: &str) -> Result<ModelOutput> {
        let context = between(prompt, "### CONTEXT FROM VIDEO TRANSCRIPT:", "### IMPORTANT");
        let question = between(prompt, "### Question:", "### Answer:");

        if context == crate::config::NO_CONTEXT {
            return Ok(ModelOutput::Text(crate::config::NOT_DISCUSSED.to_string()));
        }

        let wanted: HashSet<String> = keywords(question).into_iter().collect();
        let best = context
            .split_inclusive(". ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|sentence| {
                let hits = keywords(sentence)
                    .iter()
                    .filter(|w| wanted.contains(*w))
                    .count();
                (hits, sentence)
            })
            .fold(None::<(usize, &str)>, |best, candidate| match best {
                Some(b) if b.0 >= candidate.0 => Some(b),
                _ => Some(candidate),
            });

        match best {
            Some((hits, sentence)) if hits > 0 => Ok(ModelOutput::Text(sentence.to_string())),
            _ => Ok(ModelOutput::Text(crate::config::NOT_DISCUSSED.to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "extractive-test"
    }
}

/// What a [`ScriptedModel`] does on every call.
pub(crate) enum Script {
    Reply(ModelOutput),
    Fail(String),
    /// Sleep before replying, to trip timeouts.
    Hang(Duration),
}

/// Model with a fixed behaviour that records its prompts.
pub(crate) struct ScriptedModel {
    script: Script,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedModel {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<ModelOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        match &self.script {
            Script::Reply(output) => Ok(output.clone()),
            Script::Fail(reason) => Err(VidqaError::Llm(reason.clone())),
            Script::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(ModelOutput::Text("too late".to_string()))
            }
        }
    }

    fn model_name(&self) -> &str {
        "scripted-test"
    }
}

/// Caption track of the test video.
pub(crate) fn track(code: &str, name: &str, is_generated: bool) -> Track {
    Track {
        video_id: "dQw4w9WgXcQ".to_string(),
        language_code: code.to_string(),
        language: name.to_string(),
        is_generated,
        url: format!("https://captions.test/{}/{}", code, is_generated),
    }
}

/// Transcript source serving canned tracks in the given listing order.
pub(crate) struct FakeSource {
    tracks: Vec<(Track, Vec<String>)>,
    list_error: Option<SourceError>,
}

impl FakeSource {
    pub(crate) fn new(tracks: Vec<(Track, Vec<&str>)>) -> Self {
        Self {
            tracks: tracks
                .into_iter()
                .map(|(track, lines)| (track, lines.into_iter().map(String::from).collect()))
                .collect(),
            list_error: None,
        }
    }

    pub(crate) fn failing(error: SourceError) -> Self {
        Self {
            tracks: Vec::new(),
            list_error: Some(error),
        }
    }
}

#[async_trait]
impl TranscriptSource for FakeSource {
    async fn list_tracks(&self, _video_id: &str) -> std::result::Result<Vec<Track>, SourceError> {
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.tracks.iter().map(|(track, _)| track.clone()).collect()),
        }
    }

    async fn fetch_track(&self, track: &Track) -> std::result::Result<Vec<String>, SourceError> {
        self.tracks
            .iter()
            .find(|(candidate, _)| candidate == track)
            .map(|(_, lines)| lines.clone())
            .ok_or_else(|| SourceError::Failed(format!("unknown track {}", track.url)))
    }
}
