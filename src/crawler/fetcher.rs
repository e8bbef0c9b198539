//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the archiver, including:
//! - Building HTTP clients with the configured user agent and trust settings
//! - GET requests bounded by a per-attempt timeout
//! - Retry with exponential backoff for transient failures
//! - Error classification (retryable vs fatal)
//! - Keeping page redirects inside the crawl's registrable domain
//! - The Content-Type gate for documents

use crate::config::FetchConfig;
use crate::url::is_same_site;
use crate::ConfigError;
use reqwest::{redirect::Policy, Certificate, Client};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Fetch timing, retry and trust settings
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Upper bound on one attempt, body included
    pub timeout: Duration,

    /// Total attempts for retryable failures (>= 1)
    pub max_attempts: u32,

    /// Backoff base; attempt `n` waits `base * 2^n`
    pub base_delay: Duration,

    /// Cap on a single backoff delay
    pub max_delay: Duration,

    pub verify_tls: bool,

    /// Extra PEM trust anchor
    pub ca_cert_path: Option<PathBuf>,

    pub user_agent: String,

    /// Registrable domain page redirects must stay within (`None` = any)
    pub redirect_scope: Option<String>,
}

impl FetchPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            verify_tls: config.verify_tls,
            ca_cert_path: config.ca_cert_path.clone(),
            user_agent: config.user_agent.clone(),
            redirect_scope: None,
        }
    }

    /// Restricts page redirects to one registrable domain
    pub fn within_domain(mut self, domain: impl Into<String>) -> Self {
        self.redirect_scope = Some(domain.into());
        self
    }

    /// Delay before retry number `retry` (0-based), capped at `max_delay`
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.min(20);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// What went wrong with a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Connection,
    ServerError(u16),
    Body,
    TlsVerification,
    ClientError(u16),
    UnexpectedStatus(u16),
    InvalidUrl,
    Redirect,
    UnsupportedContent,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Connection => write!(f, "connection error"),
            FetchErrorKind::ServerError(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::Body => write!(f, "body read error"),
            FetchErrorKind::TlsVerification => write!(f, "TLS verification failure"),
            FetchErrorKind::ClientError(code) => write!(f, "HTTP {}", code),
            FetchErrorKind::UnexpectedStatus(code) => write!(f, "unexpected HTTP {}", code),
            FetchErrorKind::InvalidUrl => write!(f, "malformed URL"),
            FetchErrorKind::Redirect => write!(f, "redirect error"),
            FetchErrorKind::UnsupportedContent => write!(f, "unsupported content type"),
        }
    }
}

/// A classified fetch failure
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Worth retrying: timeouts, connection errors, 5xx, body read errors
    #[error("transient {kind}: {message}")]
    Transient {
        kind: FetchErrorKind,
        message: String,
    },

    /// Not worth retrying
    #[error("fatal {kind}: {message}")]
    Fatal {
        kind: FetchErrorKind,
        message: String,
    },
}

impl FetchError {
    fn transient(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        FetchError::Transient {
            kind,
            message: message.into(),
        }
    }

    fn fatal(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        FetchError::Fatal {
            kind,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Transient { kind, .. } | FetchError::Fatal { kind, .. } => *kind,
        }
    }
}

/// A successful response
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Result of fetching one URL, retries included
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL as requested
    pub url: Url,

    /// URL after redirects (equal to `url` on failure)
    pub final_url: Url,

    pub outcome: Result<FetchedBody, FetchError>,

    /// Attempts made (>= 1)
    pub attempts: u32,

    /// Wall time across all attempts and backoff delays
    pub elapsed: Duration,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn status(&self) -> Option<u16> {
        self.outcome.as_ref().ok().map(|b| b.status)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.outcome.as_ref().ok().map(|b| b.body.as_slice())
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.outcome.as_ref().err()
    }

    pub fn was_redirected(&self) -> bool {
        self.url != self.final_url
    }
}

/// Maximum redirect hops per request
pub const MAX_REDIRECTS: usize = 10;

/// Redirect policy for a client
///
/// With a scope, a hop to a host outside that registrable domain aborts the
/// request with a redirect error, so off-site pages are never fetched.
fn redirect_policy(scope: Option<String>) -> Policy {
    let Some(domain) = scope else {
        return Policy::limited(MAX_REDIRECTS);
    };

    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error(format!("more than {} redirects", MAX_REDIRECTS))
        } else if !is_same_site(attempt.url(), &domain) {
            let message = format!("redirect to {} leaves {}", attempt.url(), domain);
            attempt.error(message)
        } else {
            attempt.follow()
        }
    })
}

/// Builds an HTTP client from a fetch policy
///
/// # Arguments
///
/// * `policy` - Timeout, user agent, TLS and redirect settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ConfigError::TrustMaterial)` - CA certificate missing or unparseable
/// * `Err(ConfigError::Validation)` - The client could not be constructed
pub fn build_http_client(policy: &FetchPolicy) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .user_agent(policy.user_agent.clone())
        .timeout(policy.timeout)
        .connect_timeout(policy.timeout.min(Duration::from_secs(10)))
        .redirect(redirect_policy(policy.redirect_scope.clone()))
        .danger_accept_invalid_certs(!policy.verify_tls)
        .gzip(true)
        .brotli(true);

    if let Some(path) = &policy.ca_cert_path {
        let pem = std::fs::read(path).map_err(|e| {
            ConfigError::TrustMaterial(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let certificate = Certificate::from_pem(&pem).map_err(|e| {
            ConfigError::TrustMaterial(format!("failed to parse '{}': {}", path.display(), e))
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    builder
        .build()
        .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {}", e)))
}

/// Returns true if a Content-Type names a document the extractor can parse
///
/// HTML, XHTML and XML variants are accepted.
pub fn is_document_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html")
        || content_type.contains("application/xhtml")
        || content_type.contains("xml")
}

/// Classifies a non-success HTTP status
///
/// Returns None for 2xx.
///
/// | Status | Classification |
/// |--------|----------------|
/// | 2xx | success |
/// | 4xx | fatal |
/// | 5xx | transient |
/// | other | fatal |
pub fn classify_status(status: u16) -> Option<FetchError> {
    match status {
        200..=299 => None,
        400..=499 => Some(FetchError::fatal(
            FetchErrorKind::ClientError(status),
            format!("server answered {}", status),
        )),
        500..=599 => Some(FetchError::transient(
            FetchErrorKind::ServerError(status),
            format!("server answered {}", status),
        )),
        _ => Some(FetchError::fatal(
            FetchErrorKind::UnexpectedStatus(status),
            format!("server answered {}", status),
        )),
    }
}

/// Classifies a transport-level reqwest error
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout | Retry |
/// | Connection refused / reset | Retry |
/// | Body read error | Retry |
/// | Certificate rejected (verification on) | Fatal |
/// | Malformed request URL | Fatal |
/// | Redirect loop / chain > 10 | Fatal |
pub fn classify_transport_error(err: &reqwest::Error, verify_tls: bool) -> FetchError {
    let message = error_chain_message(err);

    if err.is_builder() {
        return FetchError::fatal(FetchErrorKind::InvalidUrl, message);
    }

    if err.is_redirect() {
        return FetchError::fatal(FetchErrorKind::Redirect, message);
    }

    if is_certificate_failure(&message) {
        return classify_certificate_failure(message, verify_tls);
    }

    if err.is_timeout() {
        FetchError::transient(FetchErrorKind::Timeout, message)
    } else if err.is_body() || err.is_decode() {
        FetchError::transient(FetchErrorKind::Body, message)
    } else {
        FetchError::transient(FetchErrorKind::Connection, message)
    }
}

/// Joins an error with all of its sources
fn error_chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Classifies a rejected server certificate
///
/// Fatal while verification is on. With verification off a certificate
/// complaint can only come from the handshake itself, so it is retried like
/// any other connection failure.
fn classify_certificate_failure(message: String, verify_tls: bool) -> FetchError {
    if verify_tls {
        FetchError::fatal(FetchErrorKind::TlsVerification, message)
    } else {
        FetchError::transient(FetchErrorKind::Connection, message)
    }
}

/// True if an error message describes a rejected server certificate
fn is_certificate_failure(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("certificate")
        || message.contains("unknownissuer")
        || message.contains("self signed")
        || message.contains("self-signed")
}

/// HTTP fetcher with retry
///
/// Pages go through a client honoring the policy's redirect scope. Media
/// assets often live on CDNs, so their client follows redirects anywhere.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    asset_client: Client,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Creates a fetcher, building its HTTP clients from the policy
    pub fn new(policy: FetchPolicy) -> Result<Self, ConfigError> {
        let client = build_http_client(&policy)?;
        let asset_client = if policy.redirect_scope.is_some() {
            build_http_client(&FetchPolicy {
                redirect_scope: None,
                ..policy.clone()
            })?
        } else {
            client.clone()
        };

        Ok(Self {
            client,
            asset_client,
            policy,
        })
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches a page, accepting only HTML/XHTML/XML responses
    ///
    /// Retryable failures are retried up to `max_attempts` total attempts
    /// with exponential backoff. Fatal failures and exhausted retries are
    /// reported in the returned result rather than as an error.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        self.fetch_with_retry(url, true).await
    }

    /// Fetches a media asset (no Content-Type gate)
    pub async fn fetch_asset(&self, url: &Url) -> FetchResult {
        self.fetch_with_retry(url, false).await
    }

    async fn fetch_with_retry(&self, url: &Url, require_document: bool) -> FetchResult {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.attempt(url, require_document).await {
                Ok((final_url, body)) => {
                    return FetchResult {
                        url: url.clone(),
                        final_url,
                        outcome: Ok(body),
                        attempts,
                        elapsed: start.elapsed(),
                    };
                }
                Err(err) if err.is_retryable() && attempts < self.policy.max_attempts => {
                    let delay = self.policy.backoff_delay(attempts - 1);
                    tracing::debug!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempts,
                        self.policy.max_attempts,
                        url,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::warn!(
                            "Giving up on {} after {} attempts: {}",
                            url,
                            attempts,
                            err
                        );
                    } else {
                        tracing::debug!("Fatal fetch error for {}: {}", url, err);
                    }

                    return FetchResult {
                        url: url.clone(),
                        final_url: url.clone(),
                        outcome: Err(err),
                        attempts,
                        elapsed: start.elapsed(),
                    };
                }
            }
        }
    }

    /// One GET request, fully read
    async fn attempt(
        &self,
        url: &Url,
        require_document: bool,
    ) -> Result<(Url, FetchedBody), FetchError> {
        let client = if require_document {
            &self.client
        } else {
            &self.asset_client
        };
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, self.policy.verify_tls))?;

        let status = response.status().as_u16();
        if let Some(err) = classify_status(status) {
            return Err(err);
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if require_document {
            if let Some(ct) = &content_type {
                if !is_document_content_type(ct) {
                    return Err(FetchError::fatal(
                        FetchErrorKind::UnsupportedContent,
                        format!("expected HTML, got {}", ct),
                    ));
                }
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e, self.policy.verify_tls))?;

        Ok((
            final_url,
            FetchedBody {
                status,
                content_type,
                body: body.to_vec(),
            },
        ))
    }
}
