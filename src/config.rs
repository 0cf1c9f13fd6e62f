use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::review::DEFAULT_TOP_K;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Line-delimited review guideline corpus, read once at startup
    pub corpus_path: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Number of corpus lines retrieved per review
    pub top_k: usize,
    /// Upper bound on a single embedding or completion call, in seconds
    pub request_timeout_secs: u64,
    /// LLM provider configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for review completions
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("your_review_data.txt"),
            bind_addr: "127.0.0.1:5000".to_string(),
            top_k: DEFAULT_TOP_K,
            request_timeout_secs: 120,
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "mistral".to_string(),
            embedding_model: "mistral".to_string(),
            api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. `from_env` is the
    /// process-environment case; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("REVIEW_CORPUS_PATH") {
            config.corpus_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("REVIEW_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(val) = lookup("REVIEW_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                if v > 0 {
                    config.top_k = v;
                }
            }
        }
        if let Some(val) = lookup("REVIEW_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                if v > 0 {
                    config.request_timeout_secs = v;
                }
            }
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(model) = lookup("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
