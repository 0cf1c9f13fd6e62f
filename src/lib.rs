//! # pr-review-rag
//!
//! A retrieval-augmented pull request reviewer. A flat file of review
//! guidelines is embedded line by line at startup; each `POST /review`
//! pulls the guidelines closest to the submitted diff and hands both to a
//! language model.
//!
//! ## Architecture
//!
//! ```text
//!   startup                              per request
//!   ───────                              ───────────
//!  ┌──────────────┐                  ┌──────────────────┐
//!  │ corpus file  │                  │ POST /review     │
//!  └──────┬───────┘                  │ {"diff": "..."}  │
//!         │ one record per line      └────────┬─────────┘
//!         ▼                                   │ validate
//!  ┌──────────────┐                           ▼
//!  │   Embedder   │◄──────────────── embed diff
//!  └──────┬───────┘                           │
//!         ▼                                   ▼
//!  ┌──────────────┐   read-only      ┌──────────────────┐
//!  │ VectorStore  │─────────────────►│ top-k (k = 3)    │
//!  │ (cosine)     │                  └────────┬─────────┘
//!  └──────────────┘                           ▼
//!                                    ┌──────────────────┐
//!                                    │ prompt: context  │
//!                                    │ + review question│
//!                                    └────────┬─────────┘
//!                                             ▼
//!                                    ┌──────────────────┐
//!                                    │    Completer     │
//!                                    └────────┬─────────┘
//!                                             ▼
//!                                    {"review": "..."}
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, corpus, and LLM settings
//! - [`error`] - `ReviewError` and its HTTP status mapping
//! - [`models`] - `Record`, request/response bodies
//! - [`corpus`] - Line-delimited corpus loading
//! - [`llm`] - `Embedder`/`Completer` capabilities with Ollama and OpenAI-compatible backends
//! - [`search`] - `VectorIndex` trait, in-memory cosine store, and the set-once index slot
//! - [`review`] - The per-request retrieval and completion pipeline
//! - [`api`] - Axum router and handler
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod corpus;
pub mod error;
pub mod llm;
pub mod models;
pub mod review;
pub mod search;
pub mod state;
