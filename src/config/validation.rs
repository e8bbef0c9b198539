use crate::config::types::{
    Config, CrawlConfig, EmbeddingConfig, ExtractConfig, FetchConfig, QualityConfig,
};
use crate::ConfigError;
use url::Url;

/// Media kinds the extractor knows how to collect
pub const KNOWN_MEDIA_TYPES: &[&str] = &["images", "videos", "audio"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_extract_config(&config.extract)?;
    validate_quality_config(&config.quality)?;
    validate_embedding_config(&config.embedding, &config.quality)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "crawl limit must be >= 1 when set".to_string(),
        ));
    }

    if config.timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "crawl timeout must be >= 1 second when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch timeout must be >= 1 second, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.retry_max_delay_ms < config.retry_base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry_max_delay_ms ({}) must be >= retry_base_delay_ms ({})",
            config.retry_max_delay_ms, config.retry_base_delay_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &config.ca_cert_path {
        if !path.is_file() {
            return Err(ConfigError::TrustMaterial(format!(
                "certificate file '{}' does not exist",
                path.display()
            )));
        }
    }

    Ok(())
}

/// Validates extraction configuration
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    for media_type in &config.media_types {
        if !KNOWN_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown media type '{}', expected one of: {}",
                media_type,
                KNOWN_MEDIA_TYPES.join(", ")
            )));
        }
    }

    Ok(())
}

/// Validates quality scorer configuration
fn validate_quality_config(config: &QualityConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.threshold) {
        return Err(ConfigError::Validation(format!(
            "quality threshold must be within [0, 1], got {}",
            config.threshold
        )));
    }

    if !(0.0..=1.0).contains(&config.heuristic_weight) {
        return Err(ConfigError::Validation(format!(
            "heuristic_weight must be within [0, 1], got {}",
            config.heuristic_weight
        )));
    }

    Ok(())
}

/// Validates embedding endpoint configuration
///
/// A missing endpoint is not an error: semantic scoring degrades to
/// heuristics only.
fn validate_embedding_config(
    config: &EmbeddingConfig,
    quality: &QualityConfig,
) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.endpoint {
        let url = Url::parse(endpoint).map_err(|e| {
            ConfigError::Validation(format!("Invalid embedding endpoint '{}': {}", endpoint, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "embedding endpoint must use http or https, got '{}'",
                endpoint
            )));
        }
    }

    if quality.nlp_enabled && config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "embedding model cannot be empty when NLP scoring is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates a seed URL: must parse, use http(s), and carry a host
pub fn validate_seed_url(seed: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("'{}' has no host", seed)));
    }

    Ok(url)
}
