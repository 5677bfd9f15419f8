//! Domain logic for the knowledge-base portal client.
//!
//! Pure, I/O-free transformations shared by the HTTP client and the CLI:
//! article query building, publish-scope serialization and article payload
//! validation.

pub mod article;
pub mod error;
pub mod filters;
pub mod options;
pub mod publish_scope;
pub mod types;
