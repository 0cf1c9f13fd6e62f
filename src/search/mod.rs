//! Similarity search over the embedded corpus.

pub mod index;
pub mod vector;

pub use index::{EmbeddingIndex, IndexSlot};
pub use vector::{VectorEntry, VectorIndex, VectorStore};
