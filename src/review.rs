//! The review pipeline: validate the diff, retrieve similar guideline
//! lines, build the prompt, and ask the model. Nothing is cached and
//! nothing is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ReviewError, ReviewResult};
use crate::llm::{Completer, ReviewPrompt};
use crate::models::{ReviewRequest, ReviewResponse};
use crate::search::IndexSlot;

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Clone)]
pub struct ReviewService {
    index: IndexSlot,
    completer: Arc<dyn Completer>,
    top_k: usize,
    timeout: Duration,
}

impl ReviewService {
    pub fn new(
        index: IndexSlot,
        completer: Arc<dyn Completer>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            index,
            completer,
            top_k,
            timeout,
        }
    }

    pub async fn review(&self, req: &ReviewRequest) -> ReviewResult<ReviewResponse> {
        let diff = match req.diff.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => return Err(ReviewError::InvalidRequest),
        };

        let index = self.index.get().ok_or(ReviewError::NotReady)?;
        if index.is_empty() {
            return Err(ReviewError::NotReady);
        }
        let started = Instant::now();

        let query_embedding = tokio::time::timeout(self.timeout, index.embed_query(diff))
            .await
            .map_err(|_| ReviewError::UpstreamTimeout(self.timeout.as_secs()))?
            .map_err(|e| classify_upstream(e, self.timeout))?;
        let context = index.search_embedding(&query_embedding, self.top_k)?;
        tracing::debug!("Retrieved {} guideline records", context.len());

        let prompt = ReviewPrompt::for_diff(diff, context);

        let review = tokio::time::timeout(self.timeout, self.completer.complete(&prompt))
            .await
            .map_err(|_| ReviewError::UpstreamTimeout(self.timeout.as_secs()))?
            .map_err(|e| classify_upstream(e, self.timeout))?;

        tracing::info!(
            "Reviewed diff ({} bytes) in {:?}",
            diff.len(),
            started.elapsed()
        );

        Ok(ReviewResponse { review })
    }
}

/// HTTP client timeouts surface as `reqwest` errors; report them as
/// timeouts rather than generic upstream failures.
fn classify_upstream(err: anyhow::Error, timeout: Duration) -> ReviewError {
    let timed_out = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|e| e.is_timeout());
    if timed_out {
        ReviewError::UpstreamTimeout(timeout.as_secs())
    } else {
        ReviewError::upstream(err)
    }
}
