//! Normalized item graph handed to the store in one insert

use serde::{Deserialize, Serialize};

use super::{Author, Item, ItemMetrics, MediaAttachment};

/// A fetched item together with everything it pulls in
///
/// `referenced` holds quoted / parent posts that are stored only because the
/// root points at them. Metrics are keyed by item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGraph {
    pub root: Item,
    #[serde(default)]
    pub referenced: Vec<Item>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub metrics: Vec<(String, ItemMetrics)>,
    #[serde(default)]
    pub media: Vec<MediaAttachment>,
}

impl ItemGraph {
    #[must_use]
    pub const fn new(root: Item) -> Self {
        Self {
            root,
            referenced: Vec::new(),
            authors: Vec::new(),
            metrics: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Id of the root item
    #[must_use]
    pub fn id(&self) -> &str {
        &self.root.id
    }

    /// Root followed by every referenced item
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        std::iter::once(&self.root).chain(self.referenced.iter())
    }

    /// Mark every item in the graph, root included, as referenced
    pub fn mark_referenced(&mut self) {
        self.root.is_referenced = true;
        for item in &mut self.referenced {
            item.is_referenced = true;
        }
    }

    /// Add an author unless one with the same id is already present
    pub fn push_author(&mut self, author: Author) {
        if !self.authors.iter().any(|existing| existing.id == author.id) {
            self.authors.push(author);
        }
    }
}
