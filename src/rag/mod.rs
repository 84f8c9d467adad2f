//! RAG (Retrieval-Augmented Generation) over a single transcript.
//!
//! [`Retriever`] turns a question into the best matching segments and
//! [`AnswerGenerator`] asks the language model to answer from those segments
//! only.

pub mod context;
pub mod grounding;
mod response;

pub use context::{retrieve, RetrievedContext, Retriever, CONTEXT_SEPARATOR};
pub use response::{
    Answer, AnswerGenerator, AnswerKind, ChatModel, LanguageModel, ModelOutput, ERROR_PREFIX,
};
