use sha2::{Digest, Sha256};
use url::Url;

/// Number of hex characters kept from the SHA-256 digest
pub const FINGERPRINT_LEN: usize = 32;

/// Computes the content fingerprint of a normalized URL
///
/// The fingerprint names the page's storage directory. It depends only on the
/// URL, never on the title or body, so distinct pages cannot collide by
/// sharing a title and re-crawling a page maps it to the same directory.
///
/// # Examples
///
/// ```
/// use scrapyer::url::{content_fingerprint, normalize_url};
///
/// let a = normalize_url("http://a.test/p1#intro").unwrap();
/// let b = normalize_url("http://a.test/p1").unwrap();
/// assert_eq!(content_fingerprint(&a), content_fingerprint(&b));
/// assert_eq!(content_fingerprint(&a).len(), 32);
/// ```
pub fn content_fingerprint(normalized: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
