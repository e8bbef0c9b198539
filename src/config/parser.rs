use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a TOML config file and checks it
///
/// Absent sections and keys take their defaults; unknown keys are rejected
/// so a misspelled option never silently falls back to a default.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use scrapyer::config::load_config;
///
/// let config = load_config(Path::new("scrapyer.toml")).unwrap();
/// println!("Quality threshold: {}", config.quality.threshold);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_hash(path).map(|(config, _)| config)
}

/// Like [`load_config`], also returning the SHA-256 of the file text
///
/// The hash goes into the crawl summary so an archive can be traced back to
/// the settings that produced it.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    Ok((config, hash_config_text(&text)))
}

/// Parses and validates configuration from TOML text
pub fn parse_config(text: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 of configuration text
pub fn hash_config_text(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
