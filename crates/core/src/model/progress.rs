use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CategoryId, ContentId, PageNumber};

/// A user bookmark referencing one content item by `(category, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedItem {
    pub category: CategoryId,
    pub id: ContentId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Client-local reading state: last page per category plus bookmarks.
///
/// Serialized as a single json blob with camelCase keys and millisecond
/// timestamps. Bookmarks are kept in insertion order; at most one entry exists
/// per `(category, id)` because [`ProgressRecord::toggle_marked`] is the only
/// way to add one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    last_visited_page: BTreeMap<CategoryId, PageNumber>,
    #[serde(default)]
    marked_items: Vec<MarkedItem>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last page visited in `category`, page 1 when never visited.
    #[must_use]
    pub fn last_visited_page(&self, category: &CategoryId) -> PageNumber {
        self.last_visited_page
            .get(category)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_last_visited_page(&mut self, category: CategoryId, page: PageNumber) {
        self.last_visited_page.insert(category, page);
    }

    #[must_use]
    pub fn is_marked(&self, category: &CategoryId, id: ContentId) -> bool {
        self.position(category, id).is_some()
    }

    /// Adds the bookmark stamped with `now` if absent, removes it if present.
    ///
    /// Returns the new marked state.
    pub fn toggle_marked(&mut self, category: &CategoryId, id: ContentId, now: DateTime<Utc>) -> bool {
        if let Some(index) = self.position(category, id) {
            self.marked_items.remove(index);
            false
        } else {
            self.marked_items.push(MarkedItem {
                category: category.clone(),
                id,
                timestamp: now,
            });
            true
        }
    }

    /// Bookmarks, optionally restricted to one category, most recent first.
    ///
    /// Entries with equal timestamps are ordered by insertion, latest first.
    #[must_use]
    pub fn marked(&self, category: Option<&CategoryId>) -> Vec<MarkedItem> {
        let mut items: Vec<MarkedItem> = self
            .marked_items
            .iter()
            .rev()
            .filter(|item| category.is_none_or(|c| &item.category == c))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked_items.len()
    }

    fn position(&self, category: &CategoryId, id: ContentId) -> Option<usize> {
        self.marked_items
            .iter()
            .position(|item| &item.category == category && item.id == id)
    }
}
