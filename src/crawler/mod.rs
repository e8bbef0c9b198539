//! Crawler module for page fetching and processing
//!
//! This module contains the core archiving logic, including:
//! - The crawl controller (frontier, visited set, limits, termination)
//! - HTTP fetching with retry logic
//! - Content extraction and link discovery
//! - Media download
//! - Overall crawl coordination

pub mod controller;
mod coordinator;
pub mod extractor;
pub mod fetcher;
pub mod links;
pub mod media;

pub use controller::{CrawlController, Dequeue, QueuedUrl};
pub use coordinator::Coordinator;
pub use extractor::{ContentBlock, ContentExtractor, ExtractOptions, MediaKind, StructuralRole};
pub use fetcher::{FetchError, FetchErrorKind, FetchPolicy, FetchResult, Fetcher};
