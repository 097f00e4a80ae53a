use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use spoken_core::model::{
    CategoryId, ContentItem, ContentKind, PageNumber, decode_page, page_resource_path,
};

use crate::content::cache::PageCache;
use crate::content::config::{DiscoveryStrategy, LoaderConfig};
use crate::content::source::ContentSource;
use crate::error::ContentError;

/// Outcome of fetching one page when the caller cares about the difference
/// between "absent" and "failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    Found(Vec<ContentItem>),
    Missing,
}

/// What the paginator knows about the pages around the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub current: PageNumber,
    /// Highest page known to exist; 0 when the category has no pages at all.
    pub max_known: u32,
    /// Set when `current` does not exist and the viewer should move here instead.
    pub redirect_to: Option<PageNumber>,
}

/// Fetches category pages from a `ContentSource` and memoizes the results.
///
/// Every public operation degrades failures to "empty" / "absent" and logs
/// them, except [`ContentLoader::try_fetch_page`] which reports them. Clones
/// share one cache.
#[derive(Clone)]
pub struct ContentLoader {
    source: Arc<dyn ContentSource>,
    cache: Arc<Mutex<PageCache>>,
    config: LoaderConfig,
}

impl ContentLoader {
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>, config: LoaderConfig) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(PageCache::new())),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn cache(&self) -> MutexGuard<'_, PageCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch and decode one page, distinguishing absence from failure.
    ///
    /// Found pages and definitive absences are cached; transient failures are not.
    /// A page that decodes to zero items counts as missing.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` on transport failure, timeout, or a body that does
    /// not match the category schema.
    pub async fn try_fetch_page(
        &self,
        category: &CategoryId,
        page: PageNumber,
    ) -> Result<PageFetch, ContentError> {
        {
            let cache = self.cache();
            if let Some(items) = cache.page(category, page) {
                debug!(%category, %page, "page cache hit");
                return Ok(PageFetch::Found(items));
            }
            if cache.existence(category, page) == Some(false) {
                return Ok(PageFetch::Missing);
            }
        }

        let path = page_resource_path(category, page);
        let after = self.config.request_timeout;
        let body = match tokio::time::timeout(after, self.source.fetch(&path)).await {
            Ok(Ok(body)) => body,
            Ok(Err(source)) => return Err(ContentError::Source { path, source }),
            Err(_) => return Err(ContentError::Timeout { path, after }),
        };

        let Some(body) = body else {
            self.cache().store_missing(category, page);
            return Ok(PageFetch::Missing);
        };

        match decode_page(ContentKind::for_category(category), &body) {
            Ok(items) if items.is_empty() => {
                self.cache().store_missing(category, page);
                Ok(PageFetch::Missing)
            }
            Ok(items) => {
                self.cache().store_page(category, page, items.clone());
                Ok(PageFetch::Found(items))
            }
            Err(source) => {
                self.cache().store_missing(category, page);
                Err(ContentError::Decode { path, source })
            }
        }
    }

    /// Items of one page; empty when the page is absent or cannot be loaded.
    pub async fn fetch_page(&self, category: &CategoryId, page: PageNumber) -> Vec<ContentItem> {
        match self.try_fetch_page(category, page).await {
            Ok(PageFetch::Found(items)) => items,
            Ok(PageFetch::Missing) => {
                warn!(%category, %page, "page not found");
                Vec::new()
            }
            Err(err) => {
                warn!(%category, %page, error = %err, "failed to load page");
                Vec::new()
            }
        }
    }

    /// Whether the page exists, consistent with `fetch_page` being non-empty.
    pub async fn page_exists(&self, category: &CategoryId, page: PageNumber) -> bool {
        if let Some(known) = self.cache().existence(category, page) {
            return known;
        }
        match self.try_fetch_page(category, page).await {
            Ok(PageFetch::Found(_)) => true,
            Ok(PageFetch::Missing) => false,
            Err(err) => {
                warn!(%category, %page, error = %err, "page probe failed");
                false
            }
        }
    }

    /// Best-effort prefetch into the page cache. Failures are ignored.
    pub async fn preload_page(&self, category: &CategoryId, page: PageNumber) {
        if self.cache().existence(category, page).is_some() {
            return;
        }
        if let Err(err) = self.try_fetch_page(category, page).await {
            debug!(%category, %page, error = %err, "preload failed");
        }
    }

    /// Fire-and-forget variant of [`ContentLoader::preload_page`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_preload(&self, category: CategoryId, page: PageNumber) -> JoinHandle<()> {
        let loader = self.clone();
        tokio::spawn(async move { loader.preload_page(&category, page).await })
    }

    /// Drop cached pages and existence results of `category`.
    pub fn invalidate_category(&self, category: &CategoryId) {
        let removed = self.cache().invalidate_category(category);
        debug!(%category, removed, "invalidated category cache");
    }

    /// Pages `1..=k` where `k` is the last page before the first gap.
    ///
    /// Relies on pages being authored densely from 1. Bounded by
    /// `LoaderConfig::max_pages`.
    pub async fn discover_available_pages(&self, category: &CategoryId) -> Vec<PageNumber> {
        self.discover_available_pages_with_cancel(category, &CancellationToken::new())
            .await
            .unwrap_or_default()
    }

    /// Like [`ContentLoader::discover_available_pages`], returning `None` if
    /// `cancel` fires before discovery completes.
    pub async fn discover_available_pages_with_cancel(
        &self,
        category: &CategoryId,
        cancel: &CancellationToken,
    ) -> Option<Vec<PageNumber>> {
        let last = match self.config.strategy {
            DiscoveryStrategy::Linear => self.last_page_linear(category, cancel).await?,
            DiscoveryStrategy::Exponential => self.last_page_exponential(category, cancel).await?,
        };
        Some(pages_up_to(last))
    }

    async fn probe(&self, category: &CategoryId, page: u32, cancel: &CancellationToken) -> Option<bool> {
        let page = PageNumber::new(page).ok()?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            exists = self.page_exists(category, page) => Some(exists),
        }
    }

    async fn last_page_linear(&self, category: &CategoryId, cancel: &CancellationToken) -> Option<u32> {
        let max = self.config.max_pages;
        let mut last = 0;
        while last < max && self.probe(category, last + 1, cancel).await? {
            last += 1;
        }
        Some(last)
    }

    async fn last_page_exponential(
        &self,
        category: &CategoryId,
        cancel: &CancellationToken,
    ) -> Option<u32> {
        let max = self.config.max_pages.max(1);
        if !self.probe(category, 1, cancel).await? {
            return Some(0);
        }

        let mut last_hit = 1;
        let mut first_miss = None;
        while first_miss.is_none() && last_hit < max {
            let candidate = last_hit.saturating_mul(2).min(max);
            if self.probe(category, candidate, cancel).await? {
                last_hit = candidate;
            } else {
                first_miss = Some(candidate);
            }
        }

        let Some(mut hi) = first_miss else {
            return Some(last_hit);
        };
        // `lo` exists, `hi` does not.
        let mut lo = last_hit;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.probe(category, mid, cancel).await? {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(lo)
    }

    /// Paginator view of the pages around `current`.
    ///
    /// If `current` exists, probes up to `lookahead` following pages. Otherwise
    /// walks up from page 1 to find the highest contiguous page and asks the
    /// viewer to move there.
    pub async fn page_window(&self, category: &CategoryId, current: PageNumber) -> PageWindow {
        if self.page_exists(category, current).await {
            let mut max_known = current.get();
            let limit = current.get().saturating_add(self.config.lookahead);
            while max_known < limit {
                let Ok(candidate) = PageNumber::new(max_known + 1) else {
                    break;
                };
                if !self.page_exists(category, candidate).await {
                    break;
                }
                max_known = candidate.get();
            }
            return PageWindow {
                current,
                max_known,
                redirect_to: None,
            };
        }

        let limit = current.get().min(self.config.max_pages);
        let mut highest = 0;
        while highest < limit {
            let Ok(candidate) = PageNumber::new(highest + 1) else {
                break;
            };
            if !self.page_exists(category, candidate).await {
                break;
            }
            highest = candidate.get();
        }
        let redirect_to = PageNumber::new(highest).ok().filter(|last| *last < current);
        PageWindow {
            current,
            max_known: highest,
            redirect_to,
        }
    }
}

fn pages_up_to(last: u32) -> Vec<PageNumber> {
    (1..=last).filter_map(|p| PageNumber::new(p).ok()).collect()
}
