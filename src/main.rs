use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pr_review_rag::api;
use pr_review_rag::config::Config;
use pr_review_rag::corpus::load_corpus;
use pr_review_rag::search::EmbeddingIndex;
use pr_review_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Corpus: {}", config.corpus_path.display());
    tracing::info!(
        "LLM provider: {} ({}), chat model {}, embedding model {}",
        config.llm.provider,
        config.llm.base_url,
        config.llm.chat_model,
        config.llm.embedding_model
    );

    let state = AppState::new(&config)?;

    // The index must be fully built before the listener exists; any
    // failure here aborts startup.
    let records = load_corpus(&config.corpus_path)?;
    let index = EmbeddingIndex::build(records, state.embedder.clone()).await?;
    if state.index.publish(index).is_err() {
        anyhow::bail!("Review index was already initialized");
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
