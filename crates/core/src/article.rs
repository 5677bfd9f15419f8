//! Article payloads sent to the create/update endpoints.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::publish_scope::PublishScope;
use crate::types::DbId;

/// Minimum length of a trimmed article title.
pub const MIN_TITLE_LENGTH: usize = 3;

/// Request body for `POST /api/articles/` and `PUT /api/articles/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_for_staff: bool,
    #[serde(default = "default_is_actual")]
    pub is_actual: bool,
    #[serde(default)]
    pub category_ids: Vec<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_scope: Option<PublishScope>,
}

fn default_is_actual() -> bool {
    true
}

impl ArticleDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            is_published: false,
            is_for_staff: false,
            is_actual: true,
            category_ids: Vec::new(),
            publish_scope: None,
        }
    }

    pub fn with_scope(mut self, scope: PublishScope) -> Self {
        self.publish_scope = Some(scope);
        self
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = is_published;
        self
    }

    /// Copy of the draft with the title trimmed, as the backend stores it.
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Reject drafts the backend would refuse.
///
/// Title and content are required; the trimmed title must be at least
/// [`MIN_TITLE_LENGTH`] characters.
pub fn validate_draft(draft: &ArticleDraft) -> Result<(), CoreError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(CoreError::Validation("title is required".to_string()));
    }
    if draft.content.trim().is_empty() {
        return Err(CoreError::Validation("content is required".to_string()));
    }
    if title.chars().count() < MIN_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title must be at least {MIN_TITLE_LENGTH} characters long"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
