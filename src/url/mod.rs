//! URL handling module for Scrapyer
//!
//! This module provides crawl-key normalization, host and registrable-domain
//! extraction, and the URL-derived content fingerprint that names each
//! page's storage directory.

mod domain;
mod fingerprint;
mod normalize;

pub use domain::{extract_domain, registrable_domain, url_registrable_domain};
pub use fingerprint::{content_fingerprint, FINGERPRINT_LEN};
pub use normalize::{normalize_parsed, normalize_url};

use url::Url;

/// Returns true if `candidate` belongs to the same registrable domain as `root_domain`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scrapyer::url::is_same_site;
///
/// let link = Url::parse("http://docs.a.test/x").unwrap();
/// assert!(is_same_site(&link, "a.test"));
/// assert!(!is_same_site(&link, "b.test"));
/// ```
pub fn is_same_site(candidate: &Url, root_domain: &str) -> bool {
    url_registrable_domain(candidate).is_some_and(|d| d == root_domain)
}
