//! Saved item model and its satellite rows

use serde::{Deserialize, Serialize};

use super::Platform;

/// One saved (or referenced) remote post
///
/// Rows are created once on first fetch. A re-fetch of an existing id is
/// absorbed by the store, except that a referenced row fetched again as a
/// top-level item is promoted to top-level with the new rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Source platform
    pub platform: Platform,
    /// Platform-unique identifier
    pub id: String,
    /// Identifier of the posting account
    pub author_id: String,
    /// Groups an item with its thread; equals `id` for roots
    pub conversation_id: String,
    /// Source timestamp, as reported by the platform
    pub created_at: String,
    /// Display order, higher sorts first
    pub rank: i64,
    /// True when the row only exists because another item referenced it
    pub is_referenced: bool,
    /// Plain text body (title + body for link posts)
    pub text: String,
    /// Canonical web URL, when known
    pub url: Option<String>,
}

impl Item {
    /// Create a top-level root item with no author or content yet
    #[must_use]
    pub fn new(platform: Platform, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            platform,
            conversation_id: id.clone(),
            id,
            author_id: String::new(),
            created_at: String::new(),
            rank: 0,
            is_referenced: false,
            text: String::new(),
            url: None,
        }
    }

    #[must_use]
    pub fn by(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = author_id.into();
        self
    }

    #[must_use]
    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    #[must_use]
    pub fn created(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn referenced(mut self) -> Self {
        self.is_referenced = true;
        self
    }

    /// Whether this item starts its own conversation
    #[must_use]
    pub fn is_conversation_root(&self) -> bool {
        self.id == self.conversation_id
    }
}

/// Posting account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub platform: Platform,
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
}

/// Engagement counters captured at fetch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemMetrics {
    pub likes: i64,
    pub reposts: i64,
    pub replies: i64,
}

/// Media attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub platform: Platform,
    /// Platform media key
    pub key: String,
    pub item_id: String,
    /// e.g. `photo`, `video`, `animated_gif`
    pub kind: String,
    pub url: Option<String>,
}
