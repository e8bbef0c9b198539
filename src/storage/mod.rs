//! Storage module for persisting archived pages
//!
//! This module handles all filesystem output for the archiver, including:
//! - Output target validation and creation
//! - One directory per retained page, named by its content fingerprint
//! - Media files grouped by kind
//! - The run summary

mod fs;
mod traits;

pub use fs::{
    prepare_output_root, FsArchiveStore, CONTENT_FILE, LINKS_FILE, METADATA_FILE, SUMMARY_FILE,
};
pub use traits::{ArchiveStore, MediaAsset, PageRecord, StorageError, StorageResult};
