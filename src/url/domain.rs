use std::net::IpAddr;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scrapyer::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a host to its registrable domain
///
/// Uses the Public Suffix List, private section included, so
/// `blog.example.com` reduces to `example.com`, `news.bbc.co.uk` to
/// `bbc.co.uk` and `alice.github.io` stays `alice.github.io`. IP addresses,
/// single-label hosts (e.g. `localhost`) and bare public suffixes are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use scrapyer::url::registrable_domain;
///
/// assert_eq!(registrable_domain("docs.a.test"), "a.test");
/// assert_eq!(registrable_domain("www.bbc.co.uk"), "bbc.co.uk");
/// assert_eq!(registrable_domain("alice.github.io"), "alice.github.io");
/// assert_eq!(registrable_domain("127.0.0.1"), "127.0.0.1");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() || !host.contains('.') {
        return host;
    }

    match psl::domain_str(&host) {
        Some(domain) => domain.to_string(),
        None => host,
    }
}

/// Registrable domain of a URL's host, if it has one
pub fn url_registrable_domain(url: &Url) -> Option<String> {
    url.host_str().map(registrable_domain)
}
