use std::sync::Arc;

use tracing::info;

use spoken_core::model::{CategoryRegistry, PageNumber};
use storage::repository::Storage;

use crate::Clock;
use crate::content::{ContentLoader, ContentSource, ContentSourceConfig, LoaderConfig};
use crate::error::{AppServicesError, ReaderError};
use crate::marked::MarkedItemsService;
use crate::progress_service::ProgressService;
use crate::reader::CategoryReader;

/// Assembles app-facing services over one storage backend and one content source.
#[derive(Clone)]
pub struct AppServices {
    registry: Arc<CategoryRegistry>,
    loader: ContentLoader,
    progress: ProgressService,
    marked: MarkedItemsService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        content: &ContentSourceConfig,
        config: LoaderConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source = content.build();
        info!(content = %source.describe(), "content source ready");
        Ok(Self::from_parts(&storage, source, config, clock))
    }

    #[must_use]
    pub fn from_parts(
        storage: &Storage,
        source: Arc<dyn ContentSource>,
        config: LoaderConfig,
        clock: Clock,
    ) -> Self {
        let loader = ContentLoader::new(source, config);
        let progress = ProgressService::new(clock, Arc::clone(&storage.kv));
        let marked = MarkedItemsService::new(loader.clone(), progress.clone());
        Self {
            registry: Arc::new(CategoryRegistry::builtin()),
            loader,
            progress,
            marked,
        }
    }

    #[must_use]
    pub fn registry(&self) -> Arc<CategoryRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn loader(&self) -> ContentLoader {
        self.loader.clone()
    }

    #[must_use]
    pub fn progress(&self) -> ProgressService {
        self.progress.clone()
    }

    #[must_use]
    pub fn marked(&self) -> MarkedItemsService {
        self.marked.clone()
    }

    /// Open a reader on `category`, at `start` or at the last visited page.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError` if `category` is not a registered category.
    pub async fn open_reader(
        &self,
        category: &str,
        start: Option<PageNumber>,
    ) -> Result<CategoryReader, ReaderError> {
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
