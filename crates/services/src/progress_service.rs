use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, warn};

use spoken_core::Clock;
use spoken_core::model::{CategoryId, ContentId, MarkedItem, PageNumber, ProgressRecord};
use storage::repository::{KeyValueStore, StorageError};

/// Storage key of the persisted progress blob.
pub const PROGRESS_STORAGE_KEY: &str = "english-learning-progress";

/// Reading progress and bookmarks, persisted as one json blob.
///
/// Every mutation is a read-modify-write of the whole record, serialized by an
/// internal lock so concurrent toggles from one process do not lose updates.
/// Storage problems never surface to callers: a missing or corrupt blob reads
/// as the default record and failed writes are logged. A mutation whose read
/// fails is dropped, so an unreadable store is never overwritten.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            kv,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Same store and lock, different clock.
    #[must_use]
    pub fn with_clock(&self, clock: Clock) -> Self {
        Self {
            clock,
            kv: Arc::clone(&self.kv),
            write_lock: Arc::clone(&self.write_lock),
        }
    }

    /// Snapshot of the whole record.
    pub async fn progress(&self) -> ProgressRecord {
        self.load().await
    }

    pub async fn get_last_visited_page(&self, category: &CategoryId) -> PageNumber {
        self.load().await.last_visited_page(category)
    }

    pub async fn set_last_visited_page(&self, category: &CategoryId, page: PageNumber) {
        let _guard = self.write_lock.lock().await;
        let Some(mut record) = self.load_for_update().await else {
            return;
        };
        record.set_last_visited_page(category.clone(), page);
        self.save(&record).await;
    }

    pub async fn is_marked(&self, category: &CategoryId, id: ContentId) -> bool {
        self.load().await.is_marked(category, id)
    }

    /// Add or remove the bookmark for `(category, id)`.
    ///
    /// Returns the new marked state, or `false` when the stored record could
    /// not be read and nothing was changed.
    pub async fn toggle_marked(&self, category: &CategoryId, id: ContentId) -> bool {
        let _guard = self.write_lock.lock().await;
        let Some(mut record) = self.load_for_update().await else {
            return false;
        };
        let marked = record.toggle_marked(category, id, self.clock.now());
        self.save(&record).await;
        marked
    }

    /// Bookmarks, optionally restricted to one category, most recent first.
    pub async fn list_marked(&self, category: Option<&CategoryId>) -> Vec<MarkedItem> {
        self.load().await.marked(category)
    }

    /// Forget every visited page and bookmark.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(err) = self.kv.remove_item(PROGRESS_STORAGE_KEY).await {
            error!(error = %err, "failed to clear progress");
        }
    }

    async fn load(&self) -> ProgressRecord {
        self.read().await.unwrap_or_else(|err| {
            warn!(error = %err, "failed to read progress, using defaults");
            ProgressRecord::default()
        })
    }

    /// Record to modify, or `None` when the store could not be read.
    async fn load_for_update(&self) -> Option<ProgressRecord> {
        match self.read().await {
            Ok(record) => Some(record),
            Err(err) => {
                error!(error = %err, "failed to read progress, skipping write");
                None
            }
        }
    }

    /// Missing and corrupt blobs read as the default record; only a failing
    /// store is an error.
    async fn read(&self) -> Result<ProgressRecord, StorageError> {
        let Some(raw) = self.kv.get_item(PROGRESS_STORAGE_KEY).await? else {
            return Ok(ProgressRecord::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "stored progress is corrupt, using defaults");
            ProgressRecord::default()
        }))
    }

    async fn save(&self, record: &ProgressRecord) {
        let raw = match serde_json::to_string(record) {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "failed to encode progress");
                return;
            }
        };
        if let Err(err) = self.kv.set_item(PROGRESS_STORAGE_KEY, &raw).await {
            error!(error = %err, "failed to persist progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::Duration;
    use spoken_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    /// In-memory store whose next read can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryRepository,
        fail_next_read: AtomicBool,
    }

    impl FlakyStore {
        fn fail_next_read(&self) {
            self.fail_next_read.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_next_read.swap(false, Ordering::SeqCst) {
                return Err(StorageError::Connection("database is locked".into()));
            }
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key).await
        }
    }

    fn cat(id: &str) -> CategoryId {
        CategoryId::new(id).unwrap()
    }

    fn service() -> (ProgressService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let service = ProgressService::new(fixed_clock(), Arc::new(repo.clone()));
        (service, repo)
    }

    #[tokio::test]
    async fn last_visited_page_round_trips() {
        let (progress, _) = service();
        assert_eq!(progress.get_last_visited_page(&cat("words")).await.get(), 1);

        progress
            .set_last_visited_page(&cat("words"), PageNumber::new(5).unwrap())
            .await;
        assert_eq!(progress.get_last_visited_page(&cat("words")).await.get(), 5);
        assert_eq!(progress.get_last_visited_page(&cat("phrases")).await.get(), 1);
    }

    #[tokio::test]
    async fn toggle_twice_restores_state() {
        let (progress, _) = service();
        let id = ContentId::new(7);

        assert!(progress.toggle_marked(&cat("phrases"), id).await);
        assert!(progress.is_marked(&cat("phrases"), id).await);
        assert!(!progress.toggle_marked(&cat("phrases"), id).await);
        assert!(!progress.is_marked(&cat("phrases"), id).await);
        assert!(progress.list_marked(None).await.is_empty());
    }

    #[tokio::test]
    async fn marked_items_are_newest_first_and_filterable() {
        let (progress, _) = service();
        let mut clock = fixed_clock();
        progress
            .with_clock(clock)
            .toggle_marked(&cat("phrases"), ContentId::new(7))
            .await;
        clock.advance(Duration::seconds(5));
        progress
            .with_clock(clock)
            .toggle_marked(&cat("words"), ContentId::new(3))
            .await;

        let all = progress.list_marked(None).await;
        let order: Vec<(&str, u64)> = all
            .iter()
            .map(|m| (m.category.as_str(), m.id.value()))
            .collect();
        assert_eq!(order, vec![("words", 3), ("phrases", 7)]);

        let phrases = progress.list_marked(Some(&cat("phrases"))).await;
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].id, ContentId::new(7));
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let (progress, _) = service();
        progress.toggle_marked(&cat("phrases"), ContentId::new(7)).await;
        progress.toggle_marked(&cat("words"), ContentId::new(3)).await;

        let all = progress.list_marked(None).await;
        assert_eq!(all[0].category, cat("words"));
        assert_eq!(all[1].category, cat("phrases"));
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_defaults() {
        let (progress, repo) = service();
        repo.set_item(PROGRESS_STORAGE_KEY, "{not json").await.unwrap();

        assert_eq!(progress.get_last_visited_page(&cat("words")).await.get(), 1);
        assert!(progress.list_marked(None).await.is_empty());

        // The next write replaces the corrupt blob.
        assert!(progress.toggle_marked(&cat("words"), ContentId::new(1)).await);
        assert_eq!(progress.list_marked(None).await.len(), 1);
    }

    #[tokio::test]
    async fn blob_is_written_under_the_progress_key() {
        let (progress, repo) = service();
        progress
            .set_last_visited_page(&cat("phrases"), PageNumber::new(2).unwrap())
            .await;
        progress.toggle_marked(&cat("phrases"), ContentId::new(7)).await;

        let raw = repo.get_item(PROGRESS_STORAGE_KEY).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["lastVisitedPage"]["phrases"], 2);
        assert_eq!(json["markedItems"][0]["id"], 7);
        assert_eq!(json["markedItems"][0]["timestamp"], 1_700_000_000_000_i64);
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let (progress, repo) = service();
        progress.toggle_marked(&cat("words"), ContentId::new(1)).await;
        progress.clear().await;

        assert!(repo.get_item(PROGRESS_STORAGE_KEY).await.unwrap().is_none());
        assert_eq!(progress.progress().await, ProgressRecord::default());
    }

    #[tokio::test]
    async fn concurrent_toggles_are_not_lost() {
        let (progress, _) = service();
        let mut handles = Vec::new();
        for id in 0..16 {
            let progress = progress.clone();
            handles.push(tokio::spawn(async move {
                progress.toggle_marked(&cat("words"), ContentId::new(id)).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(progress.progress().await.marked_count(), 16);
    }

    #[tokio::test]
    async fn failed_read_does_not_overwrite_stored_progress() {
        let store = Arc::new(FlakyStore::default());
        let progress = ProgressService::new(fixed_clock(), store.clone());
        for id in 1..=5 {
            progress.toggle_marked(&cat("words"), ContentId::new(id)).await;
        }
        progress
            .set_last_visited_page(&cat("words"), PageNumber::new(4).unwrap())
            .await;

        store.fail_next_read();
        progress
            .set_last_visited_page(&cat("phrases"), PageNumber::new(2).unwrap())
            .await;
        store.fail_next_read();
        assert!(!progress.toggle_marked(&cat("words"), ContentId::new(9)).await);

        let record = progress.progress().await;
        assert_eq!(record.marked_count(), 5);
        assert_eq!(record.last_visited_page(&cat("words")).get(), 4);
        assert_eq!(record.last_visited_page(&cat("phrases")).get(), 1);
    }

    #[tokio::test]
    async fn failed_read_on_query_falls_back_to_defaults() {
        let store = Arc::new(FlakyStore::default());
        let progress = ProgressService::new(fixed_clock(), store.clone());
        progress
            .set_last_visited_page(&cat("words"), PageNumber::new(3).unwrap())
            .await;

        store.fail_next_read();
        assert_eq!(progress.get_last_visited_page(&cat("words")).await.get(), 1);
        assert_eq!(progress.get_last_visited_page(&cat("words")).await.get(), 3);
    }
}
