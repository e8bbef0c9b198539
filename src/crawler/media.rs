//! Media download for retained pages
//!
//! Assets go through the same retry policy as pages but skip the
//! document Content-Type gate. A failed asset is logged and never fails
//! the page.

use crate::crawler::extractor::MediaRef;
use crate::crawler::fetcher::Fetcher;
use crate::storage::{ArchiveStore, MediaAsset};
use std::collections::HashSet;
use url::Url;

/// File name for a media URL: its last non-empty path segment
///
/// Returns `None` when the segment has no extension, since such URLs are
/// usually endpoints rather than files.
pub fn media_file_name(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;

    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }

    Some(segment.to_string())
}

/// Downloads each referenced asset into the page's media directories
///
/// # Arguments
///
/// * `fetcher` - Fetcher carrying the retry policy
/// * `store` - Archive the files are written to
/// * `fingerprint` - Page directory name
/// * `refs` - Media references from extraction
///
/// # Returns
///
/// The number of files written
pub async fn download_media(
    fetcher: &Fetcher,
    store: &dyn ArchiveStore,
    fingerprint: &str,
    refs: &[MediaRef],
) -> usize {
    let mut saved = 0;
    let mut names = HashSet::new();

    for media in refs {
        let Some(file_name) = media_file_name(&media.url) else {
            tracing::debug!("Skipping media without a file extension: {}", media.url);
            continue;
        };
        if !names.insert((media.kind, file_name.clone())) {
            tracing::debug!("Skipping duplicate media file name {}", file_name);
            continue;
        }

        let result = fetcher.fetch_asset(&media.url).await;
        let body = match result.outcome {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", media.url, e);
                continue;
            }
        };

        let asset = MediaAsset {
            kind: media.kind,
            source_url: media.url.clone(),
            file_name,
            bytes: body.body,
        };
        match store.store_media(fingerprint, &asset) {
            Ok(path) => {
                tracing::debug!("Saved {} to {}", media.url, path.display());
                saved += 1;
            }
            Err(e) => tracing::warn!("Failed to save {}: {}", media.url, e),
        }
    }

    saved
}
