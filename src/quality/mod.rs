//! Block quality scoring
//!
//! This module decides which extracted blocks are worth archiving:
//! - Heuristic signals (sentence variance, vocabulary, density, research
//!   language, UI noise)
//! - Optional semantic similarity to reference prose via an embedding provider
//! - Threshold filtering that preserves document order

pub mod embedding;
pub mod heuristics;
mod scorer;

pub use embedding::{
    cosine_similarity, provider_from_config, EmbeddingError, EmbeddingProvider,
    HttpEmbeddingProvider,
};
pub use heuristics::{HeuristicEvaluation, HeuristicScorer, HeuristicWeights};
pub use scorer::{FilterOutcome, QualityScore, QualityScorer, QUALITY_TEMPLATES, SEMANTIC_SIMILARITY};
