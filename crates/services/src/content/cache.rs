use std::collections::HashMap;

use spoken_core::model::{CategoryId, ContentItem, PageNumber};

type PageKey = (CategoryId, PageNumber);

/// Decoded pages and existence results, owned by one `ContentLoader`.
#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<PageKey, Vec<ContentItem>>,
    existence: HashMap<PageKey, bool>,
}

impl PageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(&self, category: &CategoryId, page: PageNumber) -> Option<Vec<ContentItem>> {
        self.pages.get(&(category.clone(), page)).cloned()
    }

    #[must_use]
    pub fn existence(&self, category: &CategoryId, page: PageNumber) -> Option<bool> {
        self.existence.get(&(category.clone(), page)).copied()
    }

    /// Remember a decoded, non-empty page; it exists from now on.
    pub fn store_page(&mut self, category: &CategoryId, page: PageNumber, items: Vec<ContentItem>) {
        let key = (category.clone(), page);
        self.existence.insert(key.clone(), true);
        self.pages.insert(key, items);
    }

    pub fn store_missing(&mut self, category: &CategoryId, page: PageNumber) {
        let key = (category.clone(), page);
        self.pages.remove(&key);
        self.existence.insert(key, false);
    }

    /// Drop every cached page and existence result of `category`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_category(&mut self, category: &CategoryId) -> usize {
        let before = self.pages.len() + self.existence.len();
        self.pages.retain(|(c, _), _| c != category);
        self.existence.retain(|(c, _), _| c != category);
        before - (self.pages.len() + self.existence.len())
    }

    #[must_use]
    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }
}
