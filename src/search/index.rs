use std::sync::{Arc, OnceLock};

use crate::error::{ReviewError, ReviewResult};
use crate::llm::Embedder;
use crate::models::Record;
use crate::search::vector::{VectorEntry, VectorIndex, VectorStore};

/// Corpus records embedded into a [`VectorIndex`], plus the embedder used
/// to place queries in the same space.
pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    vectors: Box<dyn VectorIndex>,
}

impl EmbeddingIndex {
    /// Embed every record and build an in-memory [`VectorStore`].
    /// Either every record is indexed or an error is returned.
    pub async fn build(records: Vec<Record>, embedder: Arc<dyn Embedder>) -> ReviewResult<Self> {
        if records.is_empty() {
            return Err(ReviewError::IndexBuild(
                "corpus contains no non-blank lines".to_string(),
            ));
        }

        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| ReviewError::IndexBuild(format!("embedding failed: {e:#}")))?;

        if embeddings.len() != records.len() {
            return Err(ReviewError::IndexBuild(format!(
                "embedder returned {} vectors for {} records",
                embeddings.len(),
                records.len()
            )));
        }

        let entries = records
            .into_iter()
            .zip(embeddings)
            .map(|(record, embedding)| VectorEntry { record, embedding })
            .collect();

        let store = VectorStore::from_entries(entries)
            .map_err(|e| ReviewError::IndexBuild(format!("{e:#}")))?;

        tracing::info!(
            "Built review index: {} records, dimension {}",
            store.len(),
            store.dimension()
        );

        Ok(Self::from_parts(embedder, Box::new(store)))
    }

    /// Assemble an index from an already-populated vector backend.
    pub fn from_parts(embedder: Arc<dyn Embedder>, vectors: Box<dyn VectorIndex>) -> Self {
        Self { embedder, vectors }
    }

    /// Embed `query` and return up to `k` records, most similar first.
    pub async fn search(&self, query: &str, k: usize) -> ReviewResult<Vec<Record>> {
        if self.vectors.is_empty() {
            return Err(ReviewError::NotReady);
        }

        let query_embedding = self
            .embed_query(query)
            .await
            .map_err(ReviewError::upstream)?;
        self.search_embedding(&query_embedding, k)
    }

    /// Place `query` in the index's vector space. Embedder errors are
    /// returned as is.
    pub async fn embed_query(&self, query: &str) -> anyhow::Result<Vec<f32>> {
        self.embedder.embed(query).await
    }

    /// Up to `k` records closest to an already-embedded query.
    pub fn search_embedding(&self, query_embedding: &[f32], k: usize) -> ReviewResult<Vec<Record>> {
        if self.vectors.is_empty() {
            return Err(ReviewError::NotReady);
        }

        if query_embedding.len() != self.vectors.dimension() {
            return Err(ReviewError::Upstream(format!(
                "query embedding has dimension {}, index has {}",
                query_embedding.len(),
                self.vectors.dimension()
            )));
        }

        Ok(self
            .vectors
            .search(query_embedding, k)
            .into_iter()
            .map(|hit| hit.record)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Process-wide holder for the review index. Empty until startup publishes
/// a fully built index; never cleared or replaced afterwards.
#[derive(Clone, Default)]
pub struct IndexSlot {
    inner: Arc<OnceLock<EmbeddingIndex>>,
}

impl IndexSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that is already ready.
    pub fn ready(index: EmbeddingIndex) -> Self {
        let slot = Self::new();
        // A fresh slot is always empty
        let _ = slot.inner.set(index);
        slot
    }

    /// Publish the index. Fails, handing the index back, if one was
    /// already published.
    pub fn publish(&self, index: EmbeddingIndex) -> Result<(), EmbeddingIndex> {
        self.inner.set(index)
    }

    pub fn get(&self) -> Option<&EmbeddingIndex> {
        self.inner.get()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.get().is_some()
    }
}
