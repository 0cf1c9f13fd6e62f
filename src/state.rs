use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::llm::{Completer, Embedder, HttpCompleter, HttpEmbedder};
use crate::review::ReviewService;
use crate::search::IndexSlot;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub index: IndexSlot,
    pub embedder: Arc<dyn Embedder>,
    pub review: ReviewService,
}

impl AppState {
    /// State backed by the configured HTTP model provider. The index slot
    /// starts empty; the caller builds and publishes the index.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let embedder = HttpEmbedder::new(http_client.clone(), config.llm.clone())?;
        let completer = HttpCompleter::new(http_client, config.llm.clone())?;

        Ok(Self::with_capabilities(
            config,
            Arc::new(embedder),
            Arc::new(completer),
        ))
    }

    /// State wired to arbitrary capability implementations.
    pub fn with_capabilities(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
    ) -> Self {
        let index = IndexSlot::new();
        let review = ReviewService::new(
            index.clone(),
            completer,
            config.top_k,
            config.request_timeout(),
        );
        Self {
            index,
            embedder,
            review,
        }
    }
}
