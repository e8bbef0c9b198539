//! Configuration module for Scrapyer
//!
//! Every recognized option lives in an explicit, defaulted struct. A TOML file
//! is optional; command-line flags are layered on top and the result is
//! validated before any network activity starts.
//!
//! # Example
//!
//! ```no_run
//! use scrapyer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrapyer.toml")).unwrap();
//! println!("Crawl enabled: {}", config.crawl.enabled);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CrawlConfig, EmbeddingConfig, ExtractConfig, FetchConfig, QualityConfig,
};

pub use parser::{hash_config_text, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_seed_url, KNOWN_MEDIA_TYPES};
