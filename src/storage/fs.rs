//! Filesystem archive backend
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   summary.md
//!   <fingerprint>/
//!     content.txt     retained blocks, blank-line separated
//!     page.toml       URL, title, status, counts
//!     links.txt       discovered links, one per line
//!     images/ videos/ audio/
//! ```

use crate::storage::traits::{ArchiveStore, MediaAsset, PageRecord, StorageError, StorageResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONTENT_FILE: &str = "content.txt";
pub const METADATA_FILE: &str = "page.toml";
pub const LINKS_FILE: &str = "links.txt";
pub const SUMMARY_FILE: &str = "summary.md";

/// `page.toml` contents
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct PageMetadata<'a> {
    url: &'a str,
    final_url: &'a str,
    fingerprint: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    status: u16,
    fetched_at: String,
    blocks_scored: usize,
    blocks_retained: usize,
    media_saved: usize,
    links_discovered: usize,
    semantic_scoring: bool,
}

/// Validates the output target and creates it if needed
///
/// An existing target must be a directory. A missing target is created
/// only when its parent already exists.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The usable output directory
/// * `Err(StorageError::InvalidTarget)` - Target is a file, or its parent
///   does not exist
pub fn prepare_output_root(root: &Path) -> StorageResult<PathBuf> {
    if root.exists() {
        if !root.is_dir() {
            return Err(StorageError::InvalidTarget(format!(
                "'{}' exists and is not a directory",
                root.display()
            )));
        }
        return Ok(root.to_path_buf());
    }

    let parent = match root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(StorageError::InvalidTarget(format!(
            "parent directory '{}' does not exist",
            parent.display()
        )));
    }

    fs::create_dir(root)?;
    tracing::debug!("Created output directory {}", root.display());
    Ok(root.to_path_buf())
}

/// Archive store writing one directory per page
#[derive(Debug, Clone)]
pub struct FsArchiveStore {
    root: PathBuf,
}

impl FsArchiveStore {
    /// Opens (and if necessary creates) an archive at `root`
    pub fn open(root: &Path) -> StorageResult<Self> {
        let root = prepare_output_root(root)?;
        Ok(Self { root })
    }
}

impl ArchiveStore for FsArchiveStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn page_directory(&self, fingerprint: &str) -> PathBuf {
        self.root.join(fingerprint)
    }

    fn store_page(&self, record: PageRecord) -> StorageResult<PathBuf> {
        let dir = self.page_directory(&record.content_fingerprint);
        fs::create_dir_all(&dir)?;

        fs::write(dir.join(CONTENT_FILE), render_blocks(&record))?;

        let metadata = PageMetadata {
            url: record.url.as_str(),
            final_url: record.final_url.as_str(),
            fingerprint: &record.content_fingerprint,
            title: record.title.as_deref(),
            status: record.status,
            fetched_at: record.fetched_at.to_rfc3339(),
            blocks_scored: record.blocks_scored,
            blocks_retained: record.retained_blocks.len(),
            media_saved: record.media_saved,
            links_discovered: record.discovered_links.len(),
            semantic_scoring: record.used_semantic,
        };
        let toml = toml::to_string(&metadata)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(dir.join(METADATA_FILE), toml)?;

        let mut links = String::new();
        for link in &record.discovered_links {
            links.push_str(link.as_str());
            links.push('\n');
        }
        fs::write(dir.join(LINKS_FILE), links)?;

        Ok(dir)
    }

    fn store_media(&self, fingerprint: &str, asset: &MediaAsset) -> StorageResult<PathBuf> {
        let file_name = checked_file_name(&asset.file_name)?;
        let dir = self
            .page_directory(fingerprint)
            .join(asset.kind.dir_name());
        fs::create_dir_all(&dir)?;

        let path = dir.join(file_name);
        fs::write(&path, &asset.bytes)?;
        Ok(path)
    }

    fn store_summary(&self, markdown: &str) -> StorageResult<PathBuf> {
        let path = self.root.join(SUMMARY_FILE);
        fs::write(&path, markdown)?;
        Ok(path)
    }
}

/// Blocks rendered in document order, one blank line apart
fn render_blocks(record: &PageRecord) -> String {
    let mut text = record
        .retained_blocks
        .iter()
        .map(|block| block.render())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Rejects names that would escape the media directory
fn checked_file_name(name: &str) -> StorageResult<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(StorageError::InvalidFileName(name.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::extractor::{ContentBlock, MediaKind, StructuralRole};
    use chrono::Utc;
    use tempfile::TempDir;
    use url::Url;

    fn create_test_record(blocks: Vec<(&str, StructuralRole)>) -> PageRecord {
        let url = Url::parse("https://example.com/article").unwrap();
        PageRecord {
            url: url.clone(),
            final_url: url.clone(),
            content_fingerprint: "0123456789abcdef0123456789abcdef".to_string(),
            title: Some("An Article".to_string()),
            status: 200,
            fetched_at: Utc::now(),
            retained_blocks: blocks
                .into_iter()
                .enumerate()
                .map(|(ordinal, (text, role))| ContentBlock {
                    text: text.to_string(),
                    role,
                    source_url: url.clone(),
                    ordinal,
                })
                .collect(),
            blocks_scored: 3,
            discovered_links: vec![
                Url::parse("https://example.com/next").unwrap(),
                Url::parse("https://example.com/prev").unwrap(),
            ],
            media_saved: 0,
            used_semantic: false,
        }
    }

    #[test]
    fn test_prepare_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("archive");

        let prepared = prepare_output_root(&root).unwrap();
        assert!(prepared.is_dir());
    }

    #[test]
    fn test_prepare_accepts_existing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(prepare_output_root(temp.path()).is_ok());
    }

    #[test]
    fn test_prepare_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            prepare_output_root(&file).unwrap_err(),
            StorageError::InvalidTarget(_)
        ));
    }

    #[test]
    fn test_prepare_rejects_missing_parent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("missing").join("archive");

        assert!(matches!(
            prepare_output_root(&root).unwrap_err(),
            StorageError::InvalidTarget(_)
        ));
    }

    #[test]
    fn test_store_page_layout() {
        let temp = TempDir::new().unwrap();
        let store = FsArchiveStore::open(temp.path()).unwrap();
        let record = create_test_record(vec![
            ("First paragraph.", StructuralRole::Other),
            ("Second paragraph.", StructuralRole::Other),
        ]);
        let fingerprint = record.content_fingerprint.clone();

        let dir = store.store_page(record).unwrap();
        assert_eq!(dir, temp.path().join(&fingerprint));

        let content = fs::read_to_string(dir.join(CONTENT_FILE)).unwrap();
        assert_eq!(content, "First paragraph.\n\nSecond paragraph.\n");

        let links = fs::read_to_string(dir.join(LINKS_FILE)).unwrap();
        assert_eq!(
            links,
            "https://example.com/next\nhttps://example.com/prev\n"
        );

        let metadata: toml::Value =
            toml::from_str(&fs::read_to_string(dir.join(METADATA_FILE)).unwrap()).unwrap();
        assert_eq!(metadata["url"].as_str(), Some("https://example.com/article"));
        assert_eq!(metadata["title"].as_str(), Some("An Article"));
        assert_eq!(metadata["status"].as_integer(), Some(200));
        assert_eq!(metadata["blocks-retained"].as_integer(), Some(2));
        assert_eq!(metadata["blocks-scored"].as_integer(), Some(3));
    }

    #[test]
    fn test_structured_rendering() {
        let temp = TempDir::new().unwrap();
        let store = FsArchiveStore::open(temp.path()).unwrap();
        let record = create_test_record(vec![
            ("Overview", StructuralRole::Heading(2)),
            ("Body text.", StructuralRole::Paragraph),
            ("A point", StructuralRole::ListItem),
        ]);

        let dir = store.store_page(record).unwrap();
        let content = fs::read_to_string(dir.join(CONTENT_FILE)).unwrap();
        assert_eq!(content, "## Overview\n\nBody text.\n\n• A point\n");
    }

    #[test]
    fn test_store_media() {
        let temp = TempDir::new().unwrap();
        let store = FsArchiveStore::open(temp.path()).unwrap();
        let asset = MediaAsset {
            kind: MediaKind::Image,
            source_url: Url::parse("https://example.com/img/chart.png").unwrap(),
            file_name: "chart.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        };

        let path = store.store_media("abc", &asset).unwrap();
        assert_eq!(path, temp.path().join("abc").join("images").join("chart.png"));
        assert_eq!(fs::read(path).unwrap(), vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_media_name_cannot_escape() {
        let temp = TempDir::new().unwrap();
        let store = FsArchiveStore::open(temp.path()).unwrap();
        let asset = MediaAsset {
            kind: MediaKind::Audio,
            source_url: Url::parse("https://example.com/a.mp3").unwrap(),
            file_name: "../escape.mp3".to_string(),
            bytes: vec![1],
        };

        assert!(matches!(
            store.store_media("abc", &asset).unwrap_err(),
            StorageError::InvalidFileName(_)
        ));
    }

    #[test]
    fn test_store_summary() {
        let temp = TempDir::new().unwrap();
        let store = FsArchiveStore::open(temp.path()).unwrap();

        let path = store.store_summary("# Summary\n").unwrap();
        assert_eq!(path, temp.path().join(SUMMARY_FILE));
    }
}
