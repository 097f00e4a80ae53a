//! Page loading: where content comes from, how it is cached, and how pages are discovered.

pub mod cache;
pub mod config;
pub mod loader;
pub mod source;

pub use cache::PageCache;
pub use config::{ContentSourceConfig, DiscoveryStrategy, LoaderConfig};
pub use loader::{ContentLoader, PageFetch, PageWindow};
pub use source::{ContentSource, DirContentSource, HttpContentSource, InMemoryContentSource};
