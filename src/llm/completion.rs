use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::http::post_json;
use crate::llm::{ensure_supported_provider, Completer, ReviewPrompt};

/// [`Completer`] backed by Ollama's `/api/chat` or an OpenAI-compatible
/// `/v1/chat/completions` endpoint. Responses are requested unstreamed.
#[derive(Clone)]
pub struct HttpCompleter {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpCompleter {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Result<Self> {
        ensure_supported_provider(&config.provider)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Completer for HttpCompleter {
    async fn complete(&self, prompt: &ReviewPrompt) -> Result<String> {
        let rendered = prompt.render();
        match self.config.provider.as_str() {
            "ollama" => call_ollama(&self.client, &self.config, &rendered).await,
            "openai" => call_openai(&self.client, &self.config, &rendered).await,
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        }
    }
}

/// A single user turn carrying the rendered prompt.
#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> Message<'a> {
    fn user(content: &'a str) -> [Self; 1] {
        [Self {
            role: "user",
            content,
        }]
    }
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: AssistantMessage,
}

async fn call_ollama(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);
    let req = OllamaChatRequest {
        model: &config.chat_model,
        messages: Message::user(prompt),
        stream: false,
    };

    let resp: OllamaChatResponse = post_json(client, &url, None, &req, "Ollama chat API").await?;
    resp.message
        .content
        .context("Ollama chat API returned a message without content")
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: AssistantMessage,
}

async fn call_openai(client: &reqwest::Client, config: &LlmConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let req = OpenAiChatRequest {
        model: &config.chat_model,
        messages: Message::user(prompt),
        temperature: 0.2,
    };

    let resp: OpenAiChatResponse = post_json(
        client,
        &url,
        config.api_key.as_deref(),
        &req,
        "OpenAI chat API",
    )
    .await?;
    first_choice_content(resp)
}

fn first_choice_content(body: OpenAiChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("OpenAI chat API returned no choices")
}
