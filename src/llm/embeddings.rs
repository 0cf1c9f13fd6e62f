use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::http::post_json;
use crate::llm::{ensure_supported_provider, Embedder};

/// Maximum characters to send per text to the embedding API.
/// Corpus lines are short, but a diff can be arbitrarily long; 3 000 chars
/// keeps dense input under an 8 192-token context even at ~2.3 tokens/char.
const MAX_EMBED_CHARS: usize = 3_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// [`Embedder`] backed by Ollama's `/api/embed` or an OpenAI-compatible
/// `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Result<Self> {
        ensure_supported_provider(&config.provider)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let embeddings = match self.config.provider.as_str() {
            "ollama" => embed_ollama(&self.client, &self.config, &truncated).await?,
            "openai" => embed_openai(&self.client, &self.config, &truncated).await?,
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        };

        if embeddings.len() != texts.len() {
            anyhow::bail!(
                "Embedding API returned {} vectors for {} inputs",
                embeddings.len(),
                texts.len()
            );
        }
        Ok(embeddings)
    }
}

const OLLAMA_BATCH: usize = 32;
const OPENAI_BATCH: usize = 64;

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    /// Ask Ollama to truncate over-long inputs instead of failing with 400.
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/api/embed", config.base_url);
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(OLLAMA_BATCH) {
        let req = OllamaEmbedRequest {
            model: &config.embedding_model,
            input: batch,
            truncate: true,
        };
        let resp: OllamaEmbedResponse =
            post_json(client, &url, None, &req, "Ollama embed API").await?;
        vectors.extend(resp.embeddings);
    }

    Ok(vectors)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(OPENAI_BATCH) {
        let req = OpenAiEmbedRequest {
            model: &config.embedding_model,
            input: batch,
        };
        let resp: OpenAiEmbedResponse = post_json(
            client,
            &url,
            config.api_key.as_deref(),
            &req,
            "OpenAI embed API",
        )
        .await?;
        vectors.extend(resp.data.into_iter().map(|d| d.embedding));
    }

    Ok(vectors)
}
