//! Scrapyer: a quality-filtering web page archiver
//!
//! This crate fetches a seed page, optionally follows same-domain links up to a
//! bound, extracts text blocks and media references, scores each block for
//! informational quality, and writes what survives to one directory per page.

pub mod config;
pub mod crawler;
pub mod output;
pub mod quality;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Scrapyer operations
#[derive(Debug, Error)]
pub enum ScrapyerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid seed URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid output target: {0}")]
    OutputTarget(String),

    #[error("Invalid trust material: {0}")]
    TrustMaterial(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use output::CrawlSummary;
pub use quality::{QualityScore, QualityScorer};
pub use state::{CrawlPhase, PageOutcome, SkipReason, TerminationReason};
pub use crate::url::{content_fingerprint, normalize_url, registrable_domain};
