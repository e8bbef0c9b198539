//! Block quality scoring
//!
//! A block's score is its heuristic score, optionally blended with a
//! semantic score when an embedding provider is available:
//!
//! `score = α·heuristic + (1 - α)·semantic`
//!
//! The semantic score is the best cosine similarity between the block and
//! [`QUALITY_TEMPLATES`], clamped to [0, 1]. Template embeddings are computed
//! once; if that fails the scorer runs heuristics-only for the whole crawl.

use crate::config::QualityConfig;
use crate::crawler::extractor::ContentBlock;
use crate::quality::embedding::{cosine_similarity, EmbeddingProvider};
use crate::quality::heuristics::{HeuristicScorer, HeuristicWeights};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reference prose the semantic component compares against
pub const QUALITY_TEMPLATES: [&str; 4] = [
    "Researchers conducted a comprehensive study analyzing the effects and implications.",
    "The scientific evidence demonstrates significant findings about the phenomenon.",
    "According to published research, the data indicates important correlations.",
    "Scientists discovered new insights through systematic investigation and analysis.",
];

/// Signal name for the semantic component
pub const SEMANTIC_SIMILARITY: &str = "semantic_similarity";

/// Quality score of one block
#[derive(Debug, Clone, PartialEq)]
pub struct QualityScore {
    /// Final score in [0, 1]
    pub value: f64,

    /// Per-signal breakdown (heuristic signals, plus semantic when used)
    pub signals: BTreeMap<String, f64>,

    /// True if the semantic component contributed to `value`
    pub used_semantic: bool,
}

impl QualityScore {
    fn zero() -> Self {
        Self {
            value: 0.0,
            signals: BTreeMap::new(),
            used_semantic: false,
        }
    }
}

/// Outcome of filtering one page's blocks
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Blocks that passed, document order preserved
    pub retained: Vec<ContentBlock>,

    /// Blocks that were scored (all non-empty input blocks)
    pub scored: usize,

    /// True if any block's score used the semantic component
    pub used_semantic: bool,
}

/// Template embeddings computed once at construction
#[derive(Debug)]
struct SemanticReference {
    provider: Arc<dyn EmbeddingProvider>,
    templates: Vec<Vec<f32>>,
}

/// Block quality scorer
///
/// Heuristics always run. With a provider available the final score blends
/// in the best cosine similarity against the quality templates:
/// `alpha * heuristic + (1 - alpha) * semantic`. A provider that fails
/// during construction disables the semantic component for the whole run;
/// one that fails on a single block leaves that block heuristic-only.
#[derive(Debug)]
pub struct QualityScorer {
    heuristics: HeuristicScorer,
    filter_enabled: bool,
    threshold: f64,
    heuristic_weight: f64,
    semantic: Option<SemanticReference>,
}

impl QualityScorer {
    /// Creates a scorer
    ///
    /// # Arguments
    ///
    /// * `config` - Threshold, blend weight and NLP toggle
    /// * `provider` - Embedding provider; ignored unless NLP scoring is enabled
    pub fn new(config: &QualityConfig, provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        let semantic = if config.nlp_enabled {
            provider.and_then(embed_templates)
        } else {
            None
        };

        Self {
            heuristics: HeuristicScorer::new(HeuristicWeights::default(), config.min_chars),
            filter_enabled: config.enabled,
            threshold: config.threshold,
            heuristic_weight: config.heuristic_weight.clamp(0.0, 1.0),
            semantic,
        }
    }

    /// Creates a heuristic-only scorer
    pub fn heuristics_only(config: &QualityConfig) -> Self {
        Self::new(config, None)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    pub fn semantic_enabled(&self) -> bool {
        self.semantic.is_some()
    }

    /// Scores a block
    pub fn score(&self, block: &ContentBlock) -> QualityScore {
        self.score_text(&block.text)
    }

    /// Scores raw text
    ///
    /// Text below the minimum length (and any whitespace-only text) scores 0
    /// without consulting the provider.
    pub fn score_text(&self, text: &str) -> QualityScore {
        if !self.heuristics.is_scorable(text) {
            return QualityScore::zero();
        }

        let heuristic = self.heuristics.evaluate(text);
        let mut signals = heuristic.signals;

        let semantic = self
            .semantic
            .as_ref()
            .and_then(|reference| reference.best_similarity(text));

        match semantic {
            Some(similarity) => {
                signals.insert(SEMANTIC_SIMILARITY.to_string(), similarity);
                let alpha = self.heuristic_weight;
                QualityScore {
                    value: (alpha * heuristic.score + (1.0 - alpha) * similarity).clamp(0.0, 1.0),
                    signals,
                    used_semantic: true,
                }
            }
            None => QualityScore {
                value: heuristic.score,
                signals,
                used_semantic: false,
            },
        }
    }

    /// True if the block clears `threshold`
    ///
    /// Whitespace-only blocks never pass, even at threshold 0.
    pub fn is_quality(&self, block: &ContentBlock, threshold: f64) -> bool {
        if block.text.trim().is_empty() {
            return false;
        }
        self.score(block).value >= threshold
    }

    /// Scores every block of a page and keeps those that pass
    ///
    /// With the filter disabled every non-empty block is kept unscored.
    pub fn filter_blocks(&self, blocks: Vec<ContentBlock>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for block in blocks {
            if block.text.trim().is_empty() {
                continue;
            }

            if !self.filter_enabled {
                outcome.retained.push(block);
                continue;
            }

            let score = self.score(&block);
            outcome.scored += 1;
            outcome.used_semantic |= score.used_semantic;

            if score.value >= self.threshold {
                outcome.retained.push(block);
            } else {
                tracing::trace!(
                    "Dropped block {} of {} (score {:.3})",
                    block.ordinal,
                    block.source_url,
                    score.value
                );
            }
        }

        outcome
    }
}

/// Embeds the quality templates, or logs and returns None on failure
fn embed_templates(provider: Arc<dyn EmbeddingProvider>) -> Option<SemanticReference> {
    match provider.embed_batch(&QUALITY_TEMPLATES) {
        Ok(templates) if templates.len() == QUALITY_TEMPLATES.len() => {
            tracing::info!(
                "Semantic scoring enabled via '{}' provider ({} templates)",
                provider.name(),
                templates.len()
            );
            Some(SemanticReference {
                provider,
                templates,
            })
        }
        Ok(templates) => {
            tracing::warn!(
                "Embedding provider returned {} template vectors, expected {}; using heuristics only",
                templates.len(),
                QUALITY_TEMPLATES.len()
            );
            None
        }
        Err(e) => {
            tracing::warn!("Embedding provider unavailable, using heuristics only: {}", e);
            None
        }
    }
}

impl SemanticReference {
    /// Highest template similarity, clamped to [0, 1]; None on provider failure
    fn best_similarity(&self, text: &str) -> Option<f64> {
        let embedding = match self.provider.embed(text) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::debug!("Semantic scoring failed for block: {}", e);
                return None;
            }
        };

        let best = self
            .templates
            .iter()
            .filter_map(|template| cosine_similarity(&embedding, template).ok())
            .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))?;

        Some(f64::from(best).clamp(0.0, 1.0))
    }
}
