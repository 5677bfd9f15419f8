//! Async HTTP client for the knowledge-base articles API.
//!
//! Dispatches queries built by [`kb_core::filters`] and submits article
//! payloads carrying scopes built by [`kb_core::publish_scope`].

pub mod api;
pub mod config;
pub mod models;

pub use api::{ApiError, ArticlesApi};
pub use config::ClientConfig;
