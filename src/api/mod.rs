//! HTTP surface: a single `POST /review` route.

pub mod review;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/review", post(review::review))
        .with_state(state)
}
