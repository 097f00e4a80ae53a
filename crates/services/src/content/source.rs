use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use spoken_core::model::{CategoryId, PageNumber, page_resource_path};

use crate::error::SourceError;

/// Where static page files are read from.
///
/// Requests are idempotent reads; implementations must tolerate concurrent and
/// repeated calls for the same path.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read the resource at `path` (e.g. `/data/words/1.words.json`).
    ///
    /// Returns `Ok(None)` when the resource definitively does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` for transport failures and unexpected statuses.
    async fn fetch(&self, path: &str) -> Result<Option<String>, SourceError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

//
// ─── HTTP ──────────────────────────────────────────────────────────────────────
//

/// Reads pages from a static web server.
#[derive(Clone)]
pub struct HttpContentSource {
    client: Client,
    base: Url,
}

impl HttpContentSource {
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self::with_client(Client::new(), base)
    }

    #[must_use]
    pub fn with_client(client: Client, mut base: Url) -> Self {
        // `Url::join` replaces the last segment unless the base ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { client, base }
    }

    fn resolve(&self, path: &str) -> Result<Url, SourceError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| SourceError::InvalidPath(format!("{path}: {err}")))
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SourceError> {
        let url = self.resolve(path)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::HttpStatus(status));
        }

        Ok(Some(response.text().await?))
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

//
// ─── DIRECTORY ─────────────────────────────────────────────────────────────────
//

/// Reads pages from a static file tree on disk (the web root).
#[derive(Debug, Clone)]
pub struct DirContentSource {
    root: PathBuf,
}

impl DirContentSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for DirContentSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SourceError> {
        let full = self.root.join(path.trim_start_matches('/'));
        match tokio::fs::read_to_string(&full).await {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SourceError::Io(err)),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

//
// ─── IN MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
enum Resource {
    Body(String),
    Failing,
}

#[derive(Default)]
struct InMemoryState {
    resources: HashMap<String, Resource>,
    requests: Vec<String>,
}

/// In-memory content for tests and demos, with request logging and failure injection.
#[derive(Clone, Default)]
pub struct InMemoryContentSource {
    state: Arc<Mutex<InMemoryState>>,
    delay: Option<Duration>,
}

impl InMemoryContentSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to exercise request timeouts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, path: impl Into<String>, body: impl Into<String>) {
        self.state()
            .resources
            .insert(path.into(), Resource::Body(body.into()));
    }

    /// Publish `body` at the conventional path of `category`/`page`.
    pub fn insert_page(&self, category: &CategoryId, page: PageNumber, body: impl Into<String>) {
        self.insert(page_resource_path(category, page), body);
    }

    /// Make every request for `path` fail with a transient error until replaced.
    pub fn fail(&self, path: impl Into<String>) {
        self.state().resources.insert(path.into(), Resource::Failing);
    }

    /// Total number of requests served, including misses and failures.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    #[must_use]
    pub fn requests_for(&self, path: &str) -> usize {
        self.state().requests.iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl ContentSource for InMemoryContentSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        state.requests.push(path.to_owned());
        match state.resources.get(path) {
            Some(Resource::Body(body)) => Ok(Some(body.clone())),
            Some(Resource::Failing) => Err(SourceError::Injected(path.to_owned())),
            None => Ok(None),
        }
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
