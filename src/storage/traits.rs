//! Storage traits and error types
//!
//! This module defines the trait interface for archive backends and the
//! records handed to them.

use crate::crawler::extractor::{ContentBlock, MediaKind};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid output target: {0}")]
    InvalidTarget(String),

    #[error("Invalid media file name: {0}")]
    InvalidFileName(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Everything persisted for one retained page
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// URL as dequeued
    pub url: Url,

    /// URL after redirects
    pub final_url: Url,

    /// Directory name; derived from the normalized URL
    pub content_fingerprint: String,

    pub title: Option<String>,
    pub status: u16,
    pub fetched_at: DateTime<Utc>,

    /// Blocks that passed the quality filter, document order
    pub retained_blocks: Vec<ContentBlock>,

    /// Blocks scored before filtering
    pub blocks_scored: usize,

    pub discovered_links: Vec<Url>,

    /// Media files already written for this page
    pub media_saved: usize,

    pub used_semantic: bool,
}

/// A downloaded media file
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub kind: MediaKind,
    pub source_url: Url,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Trait for archive backend implementations
///
/// Implementations must be safe to call from several page workers at once;
/// distinct pages never share a directory.
pub trait ArchiveStore: Send + Sync {
    /// Archive root directory
    fn root(&self) -> &Path;

    /// Directory that holds (or would hold) a page's files
    fn page_directory(&self, fingerprint: &str) -> PathBuf;

    /// Writes a page's text, metadata and link list
    ///
    /// # Returns
    ///
    /// The page directory
    fn store_page(&self, record: PageRecord) -> StorageResult<PathBuf>;

    /// Writes one media file under the page's media subdirectory
    ///
    /// # Returns
    ///
    /// The path of the written file
    fn store_media(&self, fingerprint: &str, asset: &MediaAsset) -> StorageResult<PathBuf>;

    /// Writes the run summary next to the page directories
    fn store_summary(&self, markdown: &str) -> StorageResult<PathBuf>;
}
