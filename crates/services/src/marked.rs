use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use spoken_core::model::{CategoryId, ContentId, ContentItem, MarkedItem};

use crate::content::ContentLoader;
use crate::progress_service::ProgressService;

/// A bookmark paired with the content it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMark {
    pub marked: MarkedItem,
    pub item: ContentItem,
}

/// The "marked items" view across every category.
#[derive(Clone)]
pub struct MarkedItemsService {
    loader: ContentLoader,
    progress: ProgressService,
}

impl MarkedItemsService {
    #[must_use]
    pub fn new(loader: ContentLoader, progress: ProgressService) -> Self {
        Self { loader, progress }
    }

    /// Bookmarks (newest first, optionally of one category) with their content.
    ///
    /// Each category's discovered pages are searched; bookmarks whose content
    /// no longer exists are left out.
    pub async fn resolve(&self, category: Option<&CategoryId>) -> Vec<ResolvedMark> {
        let marks = self.progress.list_marked(category).await;
        let mut indexes: HashMap<CategoryId, HashMap<ContentId, ContentItem>> = HashMap::new();

        let mut resolved = Vec::with_capacity(marks.len());
        for marked in marks {
            if !indexes.contains_key(&marked.category) {
                let index = self.index_category(&marked.category).await;
                indexes.insert(marked.category.clone(), index);
            }
            let item = indexes
                .get(&marked.category)
                .and_then(|index| index.get(&marked.id))
                .cloned();
            match item {
                Some(item) => resolved.push(ResolvedMark { marked, item }),
                None => debug!(
                    category = %marked.category,
                    id = %marked.id,
                    "marked item not found in any page"
                ),
            }
        }
        resolved
    }

    async fn index_category(&self, category: &CategoryId) -> HashMap<ContentId, ContentItem> {
        let mut index = HashMap::new();
        for page in self.loader.discover_available_pages(category).await {
            for item in self.loader.fetch_page(category, page).await {
                index.entry(item.id()).or_insert(item);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use spoken_core::model::PageNumber;
    use spoken_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    use crate::content::{InMemoryContentSource, LoaderConfig};

    fn cat(id: &str) -> CategoryId {
        CategoryId::new(id).unwrap()
    }

    fn service(source: &InMemoryContentSource) -> MarkedItemsService {
        let loader = ContentLoader::new(Arc::new(source.clone()), LoaderConfig::default());
        let progress = ProgressService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        MarkedItemsService::new(loader, progress)
    }

    #[tokio::test]
    async fn resolves_items_beyond_the_first_page() {
        let source = InMemoryContentSource::new();
        source.insert_page(
            &cat("phrases"),
            PageNumber::FIRST,
            r#"[{"id": 1, "phrase": "on the fence", "meaning": "undecided"}]"#,
        );
        source.insert_page(
            &cat("phrases"),
            PageNumber::new(2).unwrap(),
            r#"[{"id": 7, "phrase": "hit the sack", "meaning": "go to bed"}]"#,
        );
        let marked = service(&source);
        marked.progress.toggle_marked(&cat("phrases"), ContentId::new(7)).await;

        let resolved = marked.resolve(None).await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].item.title(), "hit the sack");
        assert_eq!(resolved[0].marked.category, cat("phrases"));
    }

    #[tokio::test]
    async fn dangling_bookmarks_are_skipped() {
        let source = InMemoryContentSource::new();
        source.insert_page(
            &cat("words"),
            PageNumber::FIRST,
            r#"[{"id": 1, "word": "brisk", "meaning": "quick"}]"#,
        );
        let marked = service(&source);
        marked.progress.toggle_marked(&cat("words"), ContentId::new(1)).await;
        marked.progress.toggle_marked(&cat("words"), ContentId::new(99)).await;
        marked.progress.toggle_marked(&cat("office"), ContentId::new(3)).await;

        let resolved = marked.resolve(None).await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].item.id(), ContentId::new(1));

        assert!(marked.resolve(Some(&cat("office"))).await.is_empty());
    }
}
