//! Grounded answer generation.

use super::context::RetrievedContext;
use super::grounding::lexical_overlap;
use crate::config::{render_grounding_prompt, LlmSettings, NOT_DISCUSSED};
use crate::error::{with_timeout, Result, VidqaError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Prefix of every answer produced from a failure.
pub const ERROR_PREFIX: &str = "Error generating answer: ";

/// Raw output of a language model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutput {
    Text(String),
    /// Multi-part output, e.g. several returned choices.
    Parts(Vec<String>),
}

impl ModelOutput {
    /// Collapse into a single string, joining parts with newlines.
    pub fn flatten(self) -> String {
        match self {
            ModelOutput::Text(text) => text,
            ModelOutput::Parts(parts) => parts.join("\n"),
        }
    }
}

/// A text-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a fully rendered prompt.
    async fn complete(&self, prompt: &str) -> Result<ModelOutput>;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Language model served over an OpenAI-compatible chat endpoint.
pub struct ChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatModel {
    /// Create a chat model from settings.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.api_base, settings.timeout())?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    async fn complete(&self, prompt: &str) -> Result<ModelOutput> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| VidqaError::Llm(e.to_string()))?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidqaError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidqaError::Llm(format!("Failed to generate response: {}", e)))?;

        let mut parts: Vec<String> = response
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect();

        match parts.len() {
            0 => Err(VidqaError::Llm("Empty response from language model".to_string())),
            1 => Ok(ModelOutput::Text(parts.remove(0))),
            _ => Ok(ModelOutput::Parts(parts)),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// How an answer came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// Produced by the language model from retrieved context.
    Generated,
    /// Retrieval found nothing; the canned sentence.
    NotDiscussed,
    /// Generation failed; the text carries the error message.
    Error,
}

/// An answer to one question. Always a single string.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub kind: AnswerKind,
    /// Share of the answer's words found in the context, for generated answers.
    pub grounding: Option<f32>,
}

impl Answer {
    pub fn not_discussed() -> Self {
        Self {
            text: NOT_DISCUSSED.to_string(),
            kind: AnswerKind::NotDiscussed,
            grounding: None,
        }
    }

    /// Answer-shaped rendering of a failure.
    pub fn from_error(error: &VidqaError) -> Self {
        Self {
            text: format!("{}{}", ERROR_PREFIX, error),
            kind: AnswerKind::Error,
            grounding: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == AnswerKind::Error
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Wraps a language model with the fixed grounding prompt.
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
    min_grounding_overlap: f32,
}

impl AnswerGenerator {
    /// Create a generator with a 120 second model timeout.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            timeout: Duration::from_secs(120),
            min_grounding_overlap: 0.0,
        }
    }

    /// Set the per-call model timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Warn about answers sharing less than this fraction of words with the context.
    pub fn with_min_grounding_overlap(mut self, threshold: f32) -> Self {
        self.min_grounding_overlap = threshold;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Answer `question` from `context`. Never fails: model errors become
    /// error-prefixed answers.
    #[instrument(skip(self, context), fields(model = %self.model.model_name()))]
    pub async fn answer(&self, question: &str, context: &RetrievedContext) -> Answer {
        if context.is_empty() {
            debug!("No context retrieved, answering with the fallback sentence");
            return Answer::not_discussed();
        }

        let context_text = context.render();
        let prompt = render_grounding_prompt(&context_text, question);

        let output = with_timeout("language model", self.timeout, self.model.complete(&prompt)).await;

        match output {
            Ok(output) => {
                let text = output.flatten().trim().to_string();
                let grounding = lexical_overlap(&text, &context_text);
                if grounding < self.min_grounding_overlap {
                    warn!(
                        "Answer shares only {:.0}% of its words with the transcript context",
                        grounding * 100.0
                    );
                }
                Answer {
                    text,
                    kind: AnswerKind::Generated,
                    grounding: Some(grounding),
                }
            }
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                Answer::from_error(&e)
            }
        }
    }
}
