use crate::UrlError;
use url::Url;

/// Normalizes a URL into its crawl key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host (the parser lowercases it and drops default ports)
/// 4. Remove the fragment (everything after `#`)
/// 5. Remove an empty query string (trailing `?`)
///
/// The key is scheme + host + path + query. Two references that differ only
/// by fragment name the same page.
///
/// # Examples
///
/// ```
/// use scrapyer::url::normalize_url;
///
/// let url = normalize_url("HTTP://A.Test/p1?x=1#intro").unwrap();
/// assert_eq!(url.as_str(), "http://a.test/p1?x=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already-parsed URL (e.g. a link resolved against its page)
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
