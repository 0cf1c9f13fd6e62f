use serde::{Deserialize, Serialize};

/// A single corpus line, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub text: String,
}

impl Record {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A record returned by a vector search, with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: Record,
    pub score: f32,
}

/// Review request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub diff: Option<String>,
}

/// Review response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub review: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
