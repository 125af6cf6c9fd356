//! Adapters for the external models the chatbot depends on.
//!
//! Each model sits behind a small async trait so the retrieval pipeline and
//! the chatbot can be driven by in-process fakes in tests. The HTTP
//! implementations talk to Ollama or any OpenAI-compatible server.

pub mod cross_encoder;
pub mod embeddings;
pub mod generate;
pub mod prompt;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ChatMessage;

pub use cross_encoder::{HttpReranker, RerankResult};
pub use embeddings::HttpEmbedder;
pub use generate::{HttpChatModel, ResponseGenerator};

/// Turns texts into dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. The output is parallel with `texts`.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier of the underlying model, used to invalidate cached vectors.
    fn model_name(&self) -> &str;
}

/// Scores (query, document) pairs with a cross-encoder.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Returns one result per scored document, sorted by score descending.
    async fn rerank(&self, query: &str, documents: &[String]) -> Result<Vec<RerankResult>>;
}

/// Produces a single assistant reply for a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}
