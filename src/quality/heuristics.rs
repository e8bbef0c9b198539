//! Heuristic text-quality signals
//!
//! Five signals, each in [0, 1], combined by a fixed weighted sum:
//!
//! | Signal | Weight | Measures |
//! |--------|--------|----------|
//! | sentence_variance | 0.20 | coefficient of variation of sentence lengths |
//! | vocabulary_richness | 0.15 | type-token ratio of 3+ letter words |
//! | information_density | 0.25 | numbers, proper nouns, long terms, statistics |
//! | research_language | 0.30 | research/evidence phrasing |
//! | noise_signal | 0.10 | 1 - fraction of lines matching UI patterns |
//!
//! The weights sum to 1, so the combined score stays in [0, 1]. Text shorter
//! than the minimum length scores 0 without evaluating any signal.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};

pub const SENTENCE_VARIANCE: &str = "sentence_variance";
pub const VOCABULARY_RICHNESS: &str = "vocabulary_richness";
pub const INFORMATION_DENSITY: &str = "information_density";
pub const RESEARCH_LANGUAGE: &str = "research_language";
pub const NOISE_SIGNAL: &str = "noise_signal";

const RESEARCH_PATTERNS: &[&str] = &[
    r"\bresearchers?\s+(?:found|discovered|showed|demonstrated)",
    r"\bstud(?:y|ies)\s+(?:show|showed|suggest|found|indicate)",
    r"\bscientists?\s+(?:found|discovered|believe|think)",
    r"\bevidence\s+suggests?",
    r"\baccording\s+to\s+(?:the\s+)?(?:study|research|scientists?|researchers?)",
    r"\bpublished\s+in\s+(?:the\s+)?",
    r"\bdata\s+(?:shows?|indicates?|suggests?)",
    r"\bfindings?\s+(?:show|showed|suggest|indicate)",
];

const NOISE_PATTERNS: &[&str] = &[
    r"^(?:Top\s+\d+|View\s+All|More|Next|Previous|Read\s+More)\b",
    r"^\d+\s*$",
    r"^(?:\d{1,2}\s+)?(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s+\d{4}$",
    r"/(?:rss|feed|top|category|tag)/",
    r"\s*\|\s*",
];

const STATISTICS_TERMS: &[&str] = &["million", "billion", "percent", "average", "median", "rate"];

/// Research phrasings needed for a full research-language score
const RESEARCH_SATURATION: f64 = 3.0;

/// Sentence-length CV treated as fully natural prose
const CV_SATURATION: f64 = 0.7;

/// Signal weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicWeights {
    pub sentence_variance: f64,
    pub vocabulary_richness: f64,
    pub information_density: f64,
    pub research_language: f64,
    pub noise_signal: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            sentence_variance: 0.2,
            vocabulary_richness: 0.15,
            information_density: 0.25,
            research_language: 0.3,
            noise_signal: 0.1,
        }
    }
}

/// Heuristic evaluation of one text
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicEvaluation {
    /// Weighted sum in [0, 1]
    pub score: f64,
    /// Per-signal values (empty for text below the minimum length)
    pub signals: BTreeMap<String, f64>,
}

/// Stateless heuristic scorer
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    weights: HeuristicWeights,
    min_chars: usize,
    research: Vec<Regex>,
    noise: Vec<Regex>,
}

impl HeuristicScorer {
    pub fn new(weights: HeuristicWeights, min_chars: usize) -> Self {
        Self {
            weights,
            min_chars,
            research: compile_case_insensitive(RESEARCH_PATTERNS),
            noise: compile_case_insensitive(NOISE_PATTERNS),
        }
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// True if the text is long enough to be evaluated at all
    pub fn is_scorable(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && trimmed.chars().count() >= self.min_chars
    }

    /// Scores a text
    pub fn evaluate(&self, text: &str) -> HeuristicEvaluation {
        if !self.is_scorable(text) {
            return HeuristicEvaluation {
                score: 0.0,
                signals: BTreeMap::new(),
            };
        }

        let w = &self.weights;
        let weighted = [
            (SENTENCE_VARIANCE, sentence_variance(text), w.sentence_variance),
            (VOCABULARY_RICHNESS, vocabulary_richness(text), w.vocabulary_richness),
            (INFORMATION_DENSITY, information_density(text), w.information_density),
            (RESEARCH_LANGUAGE, self.research_language(text), w.research_language),
            (NOISE_SIGNAL, self.noise_signal(text), w.noise_signal),
        ];

        let score = weighted
            .iter()
            .map(|(_, value, weight)| value * weight)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let signals = weighted
            .iter()
            .map(|(name, value, _)| (name.to_string(), *value))
            .collect();

        HeuristicEvaluation { score, signals }
    }

    /// Fraction of research phrasings present, saturating at three
    fn research_language(&self, text: &str) -> f64 {
        let matches = self.research.iter().filter(|re| re.is_match(text)).count();
        (matches as f64 / RESEARCH_SATURATION).min(1.0)
    }

    /// 1.0 for clean prose, 0.0 when every line looks like UI chrome
    fn noise_signal(&self, text: &str) -> f64 {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let noisy = lines
            .iter()
            .filter(|line| self.noise.iter().any(|re| re.is_match(line)))
            .count();

        let ratio = noisy as f64 / lines.len().max(1) as f64;
        1.0 - ratio.min(1.0)
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(HeuristicWeights::default(), 50)
    }
}

fn compile_case_insensitive(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(&format!("(?i){}", p)).ok())
        .collect()
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Runs of word characters (letters, digits, underscore)
fn word_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
}

/// Coefficient of variation of words-per-sentence, saturating at 0.7
///
/// Fewer than two sentences gives a neutral-low 0.3.
fn sentence_variance(text: &str) -> f64 {
    let counts: Vec<f64> = sentences(text)
        .map(|s| s.split_whitespace().count() as f64)
        .collect();

    if counts.len() < 2 {
        return 0.3;
    }

    let n = counts.len() as f64;
    let mean = counts.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.3;
    }

    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let cv = variance.sqrt() / mean;
    (cv / CV_SATURATION).clamp(0.0, 1.0)
}

/// Type-token ratio over words of three or more ASCII letters
///
/// TTR below 0.3 scores 0.2, above 0.7 scores 1.0, linear in between.
/// Fewer than ten such words gives 0.4.
fn vocabulary_richness(text: &str) -> f64 {
    let words: Vec<String> = word_runs(text)
        .filter(|w| w.len() >= 3 && w.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|w| w.to_ascii_lowercase())
        .collect();

    if words.len() < 10 {
        return 0.4;
    }

    let unique: HashSet<&String> = words.iter().collect();
    let ttr = unique.len() as f64 / words.len() as f64;

    if ttr < 0.3 {
        0.2
    } else if ttr > 0.7 {
        1.0
    } else {
        (ttr - 0.3) / 0.4
    }
}

/// Presence of informative token classes
///
/// | Feature | Bonus |
/// |---------|-------|
/// | any number | 0.3 |
/// | more than 2 capitalized non-initial words | 0.3 |
/// | more than 10% of tokens longer than 8 chars | 0.2 |
/// | a statistics term | 0.2 |
///
/// Fewer than ten tokens gives 0.3.
fn information_density(text: &str) -> f64 {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 10 {
        return 0.3;
    }

    let mut score = 0.0;

    if word_runs(text).any(|w| w.starts_with(|c: char| c.is_ascii_digit())) {
        score += 0.3;
    }

    let proper_nouns: usize = sentences(text)
        .map(|sentence| {
            sentence
                .split_whitespace()
                .skip(1)
                .filter(|word| {
                    word.chars().count() > 1 && word.starts_with(|c: char| c.is_uppercase())
                })
                .count()
        })
        .sum();
    if proper_nouns > 2 {
        score += 0.3;
    }

    let long_tokens = tokens.iter().filter(|t| t.chars().count() > 8).count();
    if long_tokens as f64 > tokens.len() as f64 * 0.1 {
        score += 0.2;
    }

    if word_runs(text).any(|w| STATISTICS_TERMS.contains(&w.to_lowercase().as_str())) {
        score += 0.2;
    }

    f64::min(score, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESEARCH_PARAGRAPH: &str = "Researchers found that depression in older adults may signal \
        early stages of Parkinson's disease. The study, published in the journal Neurology by \
        teams at Harvard and Oxford, followed 2,400 participants for 12 years. According to \
        the researchers, the average risk rose by 40 percent among those with symptoms.";

    fn scorer() -> HeuristicScorer {
        HeuristicScorer::default()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = HeuristicWeights::default();
        let total = w.sentence_variance
            + w.vocabulary_richness
            + w.information_density
            + w.research_language
            + w.noise_signal;
        assert!(approx(total, 1.0));
    }

    #[test]
    fn test_short_and_blank_text_scores_zero() {
        let scorer = scorer();
        for text in ["", "   ", "\n\t\n", "Read more", "Short line of text."] {
            let evaluation = scorer.evaluate(text);
            assert_eq!(evaluation.score, 0.0, "{:?}", text);
            assert!(evaluation.signals.is_empty());
        }
    }

    #[test]
    fn test_blank_text_scores_zero_without_minimum() {
        let scorer = HeuristicScorer::new(HeuristicWeights::default(), 0);
        assert_eq!(scorer.evaluate("  \n ").score, 0.0);
        assert!(!scorer.is_scorable(""));
    }

    #[test]
    fn test_research_paragraph_scores_high() {
        let evaluation = scorer().evaluate(RESEARCH_PARAGRAPH);

        assert!(evaluation.score > 0.7, "score {}", evaluation.score);
        assert_eq!(evaluation.signals.len(), 5);
        assert!(approx(evaluation.signals[RESEARCH_LANGUAGE], 1.0));
        assert!(approx(evaluation.signals[INFORMATION_DENSITY], 1.0));
        assert!(approx(evaluation.signals[NOISE_SIGNAL], 1.0));
    }

    #[test]
    fn test_menu_text_scores_low() {
        let menu = "Home | News | Sport | Weather | Travel | Culture | Future | Worklife | More";
        let evaluation = scorer().evaluate(menu);

        assert!(evaluation.score < 0.4, "score {}", evaluation.score);
        assert!(approx(evaluation.signals[NOISE_SIGNAL], 0.0));
    }

    #[test]
    fn test_signals_within_unit_interval() {
        let texts = [
            RESEARCH_PARAGRAPH,
            "Top 10 things to do this weekend in the city, ranked by our readers and editors!!!",
            "word word word word word word word word word word word word word word word word.",
            "A. B. C. D. E. F. G. H. I. J. K. L. M. N. O. P. Q. R. S. T. U. V. W. X. Y. Z.",
        ];

        for text in texts {
            let evaluation = scorer().evaluate(text);
            assert!((0.0..=1.0).contains(&evaluation.score));
            for (name, value) in &evaluation.signals {
                assert!((0.0..=1.0).contains(value), "{} = {}", name, value);
            }
        }
    }

    #[test]
    fn test_sentence_variance() {
        assert!(approx(sentence_variance("Only one sentence here"), 0.3));
        // Equal lengths: no variation
        assert!(approx(sentence_variance("One two three. Four five six."), 0.0));
        // Lengths 1 and 9: mean 5, sample sd ~5.657, cv ~1.13 -> saturates
        assert!(approx(
            sentence_variance("Yes. This sentence is considerably longer than the first one."),
            1.0
        ));
    }

    #[test]
    fn test_vocabulary_richness() {
        assert!(approx(vocabulary_richness("too few words here"), 0.4));

        let repetitive = "data data data data data data data data data data data data";
        assert!(approx(vocabulary_richness(repetitive), 0.2));

        let varied = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        assert!(approx(vocabulary_richness(varied), 1.0));

        // 10 words, 5 unique: ttr 0.5 -> 0.5
        let half = "one two six ten red one two six ten red";
        assert!(approx(vocabulary_richness(half), 0.5));
    }

    #[test]
    fn test_information_density_bonuses() {
        assert!(approx(information_density("just a few words"), 0.3));

        let plain = "the cat sat on the mat and then it went to sleep for a while";
        assert!(approx(information_density(plain), 0.0));

        let numbers = "the cat sat on the mat 3 times and then it went to sleep";
        assert!(approx(information_density(numbers), 0.3));

        let stats = "the average cat sat on the mat and then it went to sleep";
        assert!(approx(information_density(stats), 0.2));
    }

    #[test]
    fn test_research_language_saturates() {
        let scorer = scorer();
        assert!(approx(scorer.research_language("nothing relevant"), 0.0));
        assert!(approx(
            scorer.research_language("Evidence suggests a link."),
            1.0 / 3.0
        ));
        assert!(approx(scorer.research_language(RESEARCH_PARAGRAPH), 1.0));
    }

    #[test]
    fn test_noise_signal_per_line() {
        let scorer = scorer();
        assert!(approx(scorer.noise_signal("A normal sentence."), 1.0));
        assert!(approx(scorer.noise_signal("Next\nA normal sentence."), 0.5));
        assert!(approx(scorer.noise_signal("42\nMarch 3, 2024"), 0.0));
        assert!(approx(scorer.noise_signal("Browse /category/news/ now"), 0.0));
    }
}
