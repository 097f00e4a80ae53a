use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::content::source::{ContentSource, DirContentSource, HttpContentSource};
use crate::error::SourceConfigError;

pub const DEFAULT_CONTENT_ROOT: &str = "./public";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_PAGES: u32 = 512;
pub const DEFAULT_LOOKAHEAD: u32 = 3;

/// Location of the static content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSourceConfig {
    Http(Url),
    Directory(PathBuf),
}

impl ContentSourceConfig {
    /// `http(s)://` locations are served over HTTP; anything else is a directory.
    ///
    /// # Errors
    ///
    /// Returns `SourceConfigError` for empty input or malformed URLs.
    pub fn parse(raw: &str) -> Result<Self, SourceConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SourceConfigError::Empty);
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw).map_err(|source| SourceConfigError::InvalidUrl {
                raw: raw.to_string(),
                source,
            })?;
            return Ok(Self::Http(url));
        }
        Ok(Self::Directory(PathBuf::from(raw)))
    }

    /// Reads `SPOKEN_CONTENT`, defaulting to `./public`.
    ///
    /// # Errors
    ///
    /// Returns `SourceConfigError` if the variable holds an invalid location.
    pub fn from_env() -> Result<Self, SourceConfigError> {
        let raw = env::var("SPOKEN_CONTENT").unwrap_or_else(|_| DEFAULT_CONTENT_ROOT.into());
        Self::parse(&raw)
    }

    #[must_use]
    pub fn build(&self) -> Arc<dyn ContentSource> {
        match self {
            ContentSourceConfig::Http(url) => Arc::new(HttpContentSource::new(url.clone())),
            ContentSourceConfig::Directory(root) => Arc::new(DirContentSource::new(root.clone())),
        }
    }
}

/// How `ContentLoader` finds the last page of a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Probe 1, 2, 3, ... until the first miss.
    #[default]
    Linear,
    /// Probe 1, 2, 4, 8, ... until a miss, then binary-search the boundary.
    Exponential,
}

impl FromStr for DiscoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "exponential" | "exp" => Ok(Self::Exponential),
            other => Err(format!("unknown discovery strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Upper bound on every single resource request.
    pub request_timeout: Duration,
    pub strategy: DiscoveryStrategy,
    /// Discovery never probes past this page.
    pub max_pages: u32,
    /// Pages probed beyond the current one when building a page window.
    pub lookahead: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            strategy: DiscoveryStrategy::default(),
            max_pages: DEFAULT_MAX_PAGES,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `SPOKEN_FETCH_TIMEOUT_MS` and `SPOKEN_DISCOVERY`.
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env::var("SPOKEN_FETCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
        {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(strategy) = env::var("SPOKEN_DISCOVERY")
            .ok()
            .and_then(|v| v.parse::<DiscoveryStrategy>().ok())
        {
            config.strategy = strategy;
        }
        config
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: DiscoveryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_urls_from_directories() {
        assert!(matches!(
            ContentSourceConfig::parse("https://example.com/app").unwrap(),
            ContentSourceConfig::Http(_)
        ));
        assert_eq!(
            ContentSourceConfig::parse(" ./public ").unwrap(),
            ContentSourceConfig::Directory(PathBuf::from("./public"))
        );
        assert!(matches!(
            ContentSourceConfig::parse("   "),
            Err(SourceConfigError::Empty)
        ));
        assert!(matches!(
            ContentSourceConfig::parse("http://"),
            Err(SourceConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!("Linear".parse::<DiscoveryStrategy>(), Ok(DiscoveryStrategy::Linear));
        assert_eq!("exp".parse::<DiscoveryStrategy>(), Ok(DiscoveryStrategy::Exponential));
        assert!("binary".parse::<DiscoveryStrategy>().is_err());
    }
}
