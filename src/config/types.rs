use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Scrapyer
///
/// Every field has a default so a partial (or absent) TOML file is valid.
/// Command-line flags are applied on top of the loaded values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Frontier traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlConfig {
    /// Follow same-domain links instead of archiving the seed page only
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of pages to process (unset = bounded by the frontier only)
    #[serde(default)]
    pub limit: Option<u32>,

    /// Maximum link depth from the seed page
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of concurrent page workers
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Global crawl timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: None,
            max_depth: None,
            workers: default_workers(),
            timeout_secs: None,
        }
    }
}

/// HTTP fetch and retry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FetchConfig {
    /// Upper bound per fetch attempt (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Attempts per URL for retryable failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay of the exponential backoff (milliseconds)
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Cap on a single backoff delay (milliseconds)
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    /// Extra PEM trust anchor for HTTPS connections
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
            verify_tls: true,
            ca_cert_path: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExtractConfig {
    /// Skip media-reference collection entirely
    #[serde(default)]
    pub text_only: bool,

    /// Emit heading/paragraph/list-item blocks instead of flat leaf text
    #[serde(default)]
    pub preserve_structure: bool,

    /// Media kinds to collect: "images", "videos", "audio"
    #[serde(default = "default_media_types")]
    pub media_types: Vec<String>,

    /// Remove URLs from extracted text
    #[serde(default = "default_true")]
    pub strip_urls: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            text_only: false,
            preserve_structure: false,
            media_types: default_media_types(),
            strip_urls: true,
        }
    }
}

/// Quality scorer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct QualityConfig {
    /// Drop blocks scoring below the threshold
    #[serde(default)]
    pub enabled: bool,

    /// Minimum score a block needs to be retained
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Blend in semantic similarity from the embedding provider
    #[serde(default)]
    pub nlp_enabled: bool,

    /// Weight of the heuristic score when blending (alpha)
    #[serde(default = "default_heuristic_weight")]
    pub heuristic_weight: f64,

    /// Blocks shorter than this (trimmed chars) score zero
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_threshold(),
            nlp_enabled: false,
            heuristic_weight: default_heuristic_weight(),
            min_chars: default_min_chars(),
        }
    }
}

/// OpenAI-compatible embedding endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Embeddings endpoint (e.g. "http://localhost:8080/v1/embeddings")
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Model name sent with each request
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key (falls back to OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_workers() -> u32 {
    4
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_retry_max_delay() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("scrapyer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_media_types() -> Vec<String> {
    vec!["images".to_string(), "videos".to_string(), "audio".to_string()]
}

fn default_threshold() -> f64 {
    0.6
}

fn default_heuristic_weight() -> f64 {
    0.6
}

fn default_min_chars() -> usize {
    50
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_embedding_timeout() -> u64 {
    10
}
