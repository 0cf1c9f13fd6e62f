//! Model capabilities consumed by the review pipeline.
//!
//! The pipeline only sees [`Embedder`] and [`Completer`]; the HTTP-backed
//! implementations for Ollama and OpenAI-compatible APIs live in
//! [`embeddings`] and [`completion`].

pub mod completion;
pub mod embeddings;
mod http;
pub mod prompt;

use anyhow::{Context, Result};
use async_trait::async_trait;

pub use completion::HttpCompleter;
pub use embeddings::HttpEmbedder;
pub use prompt::ReviewPrompt;

/// Text to fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text, returning vectors parallel with `texts`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .context("No embedding returned")
    }
}

/// Prompt to generated text. Called once per review, never retried.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &ReviewPrompt) -> Result<String>;
}

/// Providers the HTTP capabilities know how to talk to.
pub const SUPPORTED_PROVIDERS: &[&str] = &["ollama", "openai"];

pub(crate) fn ensure_supported_provider(provider: &str) -> Result<()> {
    if SUPPORTED_PROVIDERS.contains(&provider) {
        Ok(())
    } else {
        anyhow::bail!(
            "Unknown LLM provider: {provider} (expected one of: {})",
            SUPPORTED_PROVIDERS.join(", ")
        )
    }
}
