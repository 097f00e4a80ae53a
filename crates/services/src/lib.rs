#![forbid(unsafe_code)]

pub mod app_services;
pub mod content;
pub mod error;
pub mod marked;
pub mod progress_service;
pub mod reader;

pub use spoken_core::Clock;

pub use app_services::AppServices;
pub use content::{
    ContentLoader, ContentSource, ContentSourceConfig, DiscoveryStrategy, LoaderConfig, PageFetch,
    PageWindow,
};
pub use error::{AppServicesError, ContentError, ReaderError, SourceConfigError, SourceError};
pub use marked::{MarkedItemsService, ResolvedMark};
pub use progress_service::{PROGRESS_STORAGE_KEY, ProgressService};
pub use reader::{CategoryReader, PageView};
