//! Embedding providers for semantic quality scoring
//!
//! The scorer only needs one capability from a model: turn text into a
//! vector. Any OpenAI-compatible `/v1/embeddings` endpoint works (OpenAI,
//! text-embeddings-inference, vLLM, Ollama, LM Studio).

use crate::config::EmbeddingConfig;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Errors from an embedding provider
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// No endpoint configured or client could not be built
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    /// Request failed or the endpoint answered with an error
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    /// Vectors of different lengths cannot be compared
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// A text embedding model
///
/// Calls block; the archiver invokes providers from blocking worker threads.
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embeds a single text
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embeds several texts; the default calls `embed` for each
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Cosine similarity of two texts
    fn similarity(&self, a: &str, b: &str) -> EmbeddingResult<f32> {
        let left = self.embed(a)?;
        let right = self.embed(b)?;
        cosine_similarity(&left, &right)
    }

    /// Provider name for logs (e.g. "http")
    fn name(&self) -> &str;
}

/// Cosine similarity in [-1, 1]; zero vectors compare as 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> EmbeddingResult<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Provider backed by an OpenAI-compatible HTTP endpoint
#[derive(Debug)]
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
}

impl HttpEmbeddingProvider {
    /// Creates a provider from configuration
    ///
    /// The API key comes from the config or, failing that, `OPENAI_API_KEY`.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpEmbeddingProvider)` - Ready to use
    /// * `Err(EmbeddingError::Unavailable)` - No endpoint configured, or the
    ///   client could not be built
    pub fn new(config: &EmbeddingConfig) -> EmbeddingResult<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| EmbeddingError::Unavailable("no endpoint configured".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        if let Some(key) = &api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| {
                    EmbeddingError::Unavailable(format!("invalid API key format: {}", e))
                })?,
            );
        }

        let timeout = Duration::from_secs(config.timeout_secs);

        // The blocking client drives its own runtime and must not be built or
        // used on a thread that is already inside one.
        let client = std::thread::scope(|s| {
            s.spawn(|| {
                Client::builder()
                    .timeout(timeout)
                    .default_headers(headers)
                    .build()
            })
            .join()
        })
        .map_err(|_| EmbeddingError::Unavailable("client builder thread panicked".to_string()))?
        .map_err(|e| EmbeddingError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            "Embedding provider initialized: endpoint={}, model={}",
            endpoint,
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }

    fn request_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            encoding_format: "float",
        };

        let body = serde_json::to_vec(&request).map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("failed to serialize request: {}", e))
        })?;

        tracing::trace!(
            "Requesting {} embeddings from {}",
            texts.len(),
            self.endpoint
        );

        let (status, text) = std::thread::scope(|s| {
            s.spawn(|| {
                let response = self.client.post(&self.endpoint).body(body).send()?;
                let status = response.status();
                response.text().map(|text| (status, text))
            })
            .join()
        })
        .map_err(|_| EmbeddingError::EmbeddingFailed("request thread panicked".to_string()))?
        .map_err(|e| EmbeddingError::EmbeddingFailed(format!("HTTP request failed: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|r| r.error.message)
                .unwrap_or(text);
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "endpoint answered {}: {}",
                status, message
            )));
        }

        let response: EmbeddingResponse = serde_json::from_str(&text).map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("failed to parse response: {}", e))
        })?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.request_embeddings(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("no embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_embeddings(texts)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Builds the configured provider, if any
///
/// Returns None (with a warning) when no endpoint is configured or the
/// client cannot be built; scoring then uses heuristics only.
pub fn provider_from_config(config: &EmbeddingConfig) -> Option<Arc<dyn EmbeddingProvider>> {
    match HttpEmbeddingProvider::new(config) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::warn!("Semantic scoring disabled: {}", e);
            None
        }
    }
}
