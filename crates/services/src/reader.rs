use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use spoken_core::model::{Category, CategoryId, CategoryRegistry, ContentId, ContentItem, PageNumber};
use spoken_core::pagination::{PageLink, can_go_next, can_go_previous, visible_pages};

use crate::content::{ContentLoader, PageWindow};
use crate::error::ReaderError;
use crate::progress_service::ProgressService;

/// What a category page shows: its items, which of them are bookmarked, and
/// where the page sits among its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub category: CategoryId,
    pub page: PageNumber,
    pub items: Vec<ContentItem>,
    pub marked: Vec<ContentId>,
    pub window: PageWindow,
    pub long_form: bool,
}

impl PageView {
    #[must_use]
    pub fn is_marked(&self, id: ContentId) -> bool {
        self.marked.contains(&id)
    }

    #[must_use]
    pub fn links(&self) -> Vec<PageLink> {
        visible_pages(self.page, self.window.max_known)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        can_go_previous(self.page)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        can_go_next(self.page, self.window.max_known)
    }
}

/// Page-by-page reading of one category.
///
/// Resumes at the last visited page, clamps requests past the last existing
/// page, records every page shown, and prefetches the following page. A
/// pending prefetch is aborted when the reader moves on, closes or is dropped.
pub struct CategoryReader {
    category: Category,
    loader: ContentLoader,
    progress: ProgressService,
    view: PageView,
    preload: Option<JoinHandle<()>>,
}

impl CategoryReader {
    /// Open `category` at `start`, or at the last visited page when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError` if `category` is not a registered category.
    pub async fn open(
        registry: &CategoryRegistry,
        loader: ContentLoader,
        progress: ProgressService,
        category: &str,
        start: Option<PageNumber>,
    ) -> Result<Self, ReaderError> {
        let id = CategoryId::new(category)?;
        let category = registry
            .get(&id)
            .cloned()
            .ok_or_else(|| ReaderError::UnknownCategory(id.to_string()))?;

        let page = match start {
            Some(page) => page,
            None => progress.get_last_visited_page(&id).await,
        };
        let (view, preload) = show(&category, &loader, &progress, page).await;
        Ok(Self {
            category,
            loader,
            progress,
            view,
            preload,
        })
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub async fn go_to(&mut self, page: PageNumber) -> &PageView {
        self.abort_preload();
        let (view, preload) = show(&self.category, &self.loader, &self.progress, page).await;
        self.view = view;
        self.preload = preload;
        &self.view
    }

    /// Move to the following page; stays put on the last known page.
    pub async fn next(&mut self) -> &PageView {
        if self.view.has_next() {
            let page = self.view.page.next();
            return self.go_to(page).await;
        }
        &self.view
    }

    /// Move to the preceding page; stays put on page 1.
    pub async fn previous(&mut self) -> &PageView {
        if let Some(page) = self.view.page.previous() {
            return self.go_to(page).await;
        }
        &self.view
    }

    /// Toggle the bookmark of `id` and refresh the view. Returns the new state.
    pub async fn toggle_mark(&mut self, id: ContentId) -> bool {
        let category = self.category.id();
        let marked = self.progress.toggle_marked(category, id).await;
        self.view.items = self.loader.fetch_page(category, self.view.page).await;
        self.view.marked = marked_ids(&self.progress, category, &self.view.items).await;
        marked
    }

    /// Leave the category, dropping its cached pages.
    pub fn close(mut self) {
        self.abort_preload();
        self.loader.invalidate_category(self.category.id());
    }

    fn abort_preload(&mut self) {
        if let Some(handle) = self.preload.take() {
            handle.abort();
        }
    }
}

impl Drop for CategoryReader {
    fn drop(&mut self) {
        self.abort_preload();
    }
}

async fn show(
    category: &Category,
    loader: &ContentLoader,
    progress: &ProgressService,
    requested: PageNumber,
) -> (PageView, Option<JoinHandle<()>>) {
    let id = category.id();
    let mut window = loader.page_window(id, requested).await;
    if let Some(clamped) = window.redirect_to {
        debug!(category = %id, %requested, %clamped, "page past the end, clamping");
        window = loader.page_window(id, clamped).await;
    }

    let page = window.current;
    let items = loader.fetch_page(id, page).await;
    if !items.is_empty() {
        progress.set_last_visited_page(id, page).await;
    }
    let preload = can_go_next(page, window.max_known)
        .then(|| loader.spawn_preload(id.clone(), page.next()));

    let marked = marked_ids(progress, id, &items).await;
    let view = PageView {
        category: id.clone(),
        page,
        items,
        marked,
        window,
        long_form: category.is_long_form(),
    };
    (view, preload)
}

async fn marked_ids(
    progress: &ProgressService,
    category: &CategoryId,
    items: &[ContentItem],
) -> Vec<ContentId> {
    let record = progress.progress().await;
    items
        .iter()
        .map(ContentItem::id)
        .filter(|id| record.is_marked(category, *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use spoken_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    use crate::content::{InMemoryContentSource, LoaderConfig};

    fn cat(id: &str) -> CategoryId {
        CategoryId::new(id).unwrap()
    }

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    struct Fixture {
        registry: CategoryRegistry,
        source: InMemoryContentSource,
        loader: ContentLoader,
        progress: ProgressService,
    }

    impl Fixture {
        fn with_word_pages(count: u32) -> Self {
            let source = InMemoryContentSource::new();
            for p in 1..=count {
                let first = u64::from(p) * 10;
                source.insert_page(
                    &cat("words"),
                    page(p),
                    format!(
                        r#"[{{"id": {first}, "word": "a{first}", "meaning": "m"}},
                            {{"id": {}, "word": "b{first}", "meaning": "m"}}]"#,
                        first + 1
                    ),
                );
            }
            Self {
                registry: CategoryRegistry::builtin(),
                loader: ContentLoader::new(Arc::new(source.clone()), LoaderConfig::default()),
                source,
                progress: ProgressService::new(fixed_clock(), Arc::new(InMemoryRepository::new())),
            }
        }

        async fn open(&self, category: &str, start: Option<PageNumber>) -> Result<CategoryReader, ReaderError> {
            CategoryReader::open(
                &self.registry,
                self.loader.clone(),
                self.progress.clone(),
                category,
                start,
            )
            .await
        }
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let fixture = Fixture::with_word_pages(1);
        assert!(matches!(
            fixture.open("grammar", None).await,
            Err(ReaderError::UnknownCategory(_))
        ));
        assert!(matches!(
            fixture.open("Not Valid", None).await,
            Err(ReaderError::CategoryId(_))
        ));
    }

    #[tokio::test]
    async fn open_resumes_last_visited_page() {
        let fixture = Fixture::with_word_pages(4);
        fixture.progress.set_last_visited_page(&cat("words"), page(3)).await;

        let reader = fixture.open("words", None).await.unwrap();
        let view = reader.view();
        assert_eq!(view.page, page(3));
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.window.max_known, 4);
        assert!(view.has_previous());
        assert!(view.has_next());
        assert!(!view.long_form);
    }

    #[tokio::test]
    async fn navigation_persists_pages_and_stops_at_the_ends() {
        let fixture = Fixture::with_word_pages(2);
        let mut reader = fixture.open("words", None).await.unwrap();
        assert_eq!(reader.view().page, page(1));

        assert_eq!(reader.previous().await.page, page(1));
        assert_eq!(reader.next().await.page, page(2));
        assert_eq!(reader.next().await.page, page(2));
        assert_eq!(
            fixture.progress.get_last_visited_page(&cat("words")).await,
            page(2)
        );
    }

    #[tokio::test]
    async fn pages_past_the_end_are_clamped_and_persisted() {
        let fixture = Fixture::with_word_pages(3);
        let reader = fixture.open("words", Some(page(9))).await.unwrap();

        assert_eq!(reader.view().page, page(3));
        assert_eq!(reader.view().items[0].id(), ContentId::new(30));
        assert_eq!(
            fixture.progress.get_last_visited_page(&cat("words")).await,
            page(3)
        );
    }

    #[tokio::test]
    async fn empty_category_shows_nothing() {
        let fixture = Fixture::with_word_pages(0);
        let reader = fixture.open("phrases", None).await.unwrap();
        assert!(reader.view().items.is_empty());
        assert!(reader.view().links().is_empty());
        assert!(!reader.view().has_next());
    }

    #[tokio::test]
    async fn toggle_mark_updates_view() {
        let fixture = Fixture::with_word_pages(1);
        let mut reader = fixture.open("words", None).await.unwrap();
        let id = ContentId::new(11);

        assert!(reader.toggle_mark(id).await);
        assert!(reader.view().is_marked(id));
        assert!(fixture.progress.is_marked(&cat("words"), id).await);

        assert!(!reader.toggle_mark(id).await);
        assert!(reader.view().marked.is_empty());
    }

    #[tokio::test]
    async fn close_invalidates_cached_pages() {
        let fixture = Fixture::with_word_pages(1);
        let reader = fixture.open("words", None).await.unwrap();
        let before = fixture.source.requests_for("/data/words/1.words.json");
        reader.close();

        fixture.loader.fetch_page(&cat("words"), page(1)).await;
        assert_eq!(
            fixture.source.requests_for("/data/words/1.words.json"),
            before + 1
        );
    }

    #[tokio::test]
    async fn close_aborts_the_pending_preload() {
        let fixture = Fixture::with_word_pages(2);
        let reader = fixture.open("words", None).await.unwrap();
        let before = fixture.source.requests_for("/data/words/2.words.json");
        reader.close();

        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            fixture.source.requests_for("/data/words/2.words.json"),
            before
        );
    }
}
