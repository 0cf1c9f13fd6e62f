use anyhow::Result;

use crate::models::{Record, ScoredRecord};

/// A corpus record paired with its embedding
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub record: Record,
    pub embedding: Vec<f32>,
}

/// Nearest-neighbour lookup over a fixed set of vectors.
pub trait VectorIndex: Send + Sync {
    /// Return at most `limit` records, most similar first.
    fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of every stored vector.
    fn dimension(&self) -> usize;
}

/// In-memory vector store with brute-force cosine similarity search.
/// Built once from a complete entry set; there is no insert or delete.
#[derive(Debug)]
pub struct VectorStore {
    entries: Vec<VectorEntry>,
    dimension: usize,
}

impl VectorStore {
    /// Rejects an empty entry set, zero-length vectors, and mixed dimensions.
    pub fn from_entries(entries: Vec<VectorEntry>) -> Result<Self> {
        let Some(first) = entries.first() else {
            anyhow::bail!("Cannot build a vector store from zero entries");
        };
        let dimension = first.embedding.len();
        if dimension == 0 {
            anyhow::bail!("Embedding for {:?} is empty", first.record.text);
        }

        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {dimension}, got {} for {:?}",
                bad.embedding.len(),
                bad.record.text
            );
        }

        Ok(Self { entries, dimension })
    }
}

impl VectorIndex for VectorStore {
    fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<ScoredRecord> {
        let mut scored: Vec<(f32, &VectorEntry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(query_embedding, &e.embedding), e))
            .collect();

        // Sort descending by score; stable, so ties keep corpus order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(score, e)| ScoredRecord {
                record: e.record.clone(),
                score,
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
