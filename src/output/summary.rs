//! Crawl summary types and console report
//!
//! The coordinator records one [`PageReport`] per dequeued page; the summary
//! aggregates them into the counts printed at the end of a run and written
//! to `summary.md`.

use crate::state::{PageOutcome, SkipReason, TerminationReason};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one dequeued page
#[derive(Debug, Clone)]
pub struct PageReport {
    pub url: String,
    pub fingerprint: String,
    pub outcome: PageOutcome,
    pub blocks_scored: usize,
    pub used_semantic: bool,
}

/// A page that made it into the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedPage {
    pub url: String,
    pub fingerprint: String,
    pub blocks: usize,
    pub media: usize,
}

/// A page that was visited but not archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub url: String,
    pub reason: SkipReason,
    pub detail: String,
}

/// Summary of one archiving run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub seed: String,
    pub output_root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub config_hash: Option<String>,
    pub termination: Option<TerminationReason>,

    // Page counts
    pub pages_attempted: u64,
    pub pages_retained: u64,

    /// Dequeued pages aborted by the global crawl timeout
    pub pages_cancelled: u64,

    // Block and media counts
    pub blocks_scored: u64,
    pub blocks_retained: u64,
    pub media_saved: u64,

    /// Whether any block was scored with the semantic signal
    pub semantic_scoring: bool,

    pub retained: Vec<RetainedPage>,
    pub skipped: Vec<SkippedPage>,
}

impl CrawlSummary {
    /// Creates an empty summary stamped with the current time
    pub fn new(seed: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            seed: seed.into(),
            output_root: output_root.into(),
            started_at: Utc::now(),
            finished_at: None,
            duration: None,
            config_hash: None,
            termination: None,
            pages_attempted: 0,
            pages_retained: 0,
            pages_cancelled: 0,
            blocks_scored: 0,
            blocks_retained: 0,
            media_saved: 0,
            semantic_scoring: false,
            retained: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Folds one page's result into the totals
    pub fn record_page(&mut self, report: PageReport) {
        self.pages_attempted += 1;
        self.blocks_scored += report.blocks_scored as u64;
        self.semantic_scoring |= report.used_semantic;

        match report.outcome {
            PageOutcome::Retained { blocks, media } => {
                self.pages_retained += 1;
                self.blocks_retained += blocks as u64;
                self.media_saved += media as u64;
                self.retained.push(RetainedPage {
                    url: report.url,
                    fingerprint: report.fingerprint,
                    blocks,
                    media,
                });
            }
            PageOutcome::Skipped { reason, detail } => {
                self.skipped.push(SkippedPage {
                    url: report.url,
                    reason,
                    detail,
                });
            }
        }
    }

    /// Counts a page whose worker was aborted before it finished
    pub fn record_cancelled(&mut self) {
        self.pages_attempted += 1;
        self.pages_cancelled += 1;
    }

    /// Stamps the end of the run
    pub fn finish(&mut self, termination: TerminationReason, elapsed: Duration) {
        self.termination = Some(termination);
        self.finished_at = Some(Utc::now());
        self.duration = Some(elapsed);
    }

    pub fn pages_skipped(&self) -> u64 {
        self.skipped.len() as u64
    }

    /// Skipped pages for one reason, in the order they were recorded
    pub fn skipped_by_reason(&self, reason: SkipReason) -> Vec<&SkippedPage> {
        self.skipped.iter().filter(|s| s.reason == reason).collect()
    }

    /// Returns the share of attempted pages that were archived, as a percentage
    pub fn retention_rate(&self) -> f64 {
        if self.pages_attempted == 0 {
            return 0.0;
        }
        (self.pages_retained as f64 / self.pages_attempted as f64) * 100.0
    }
}

/// Prints a crawl summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Archive Summary ===\n");

    println!("Seed: {}", summary.seed);
    println!("Output: {}", summary.output_root.display());
    if let Some(reason) = summary.termination {
        println!("Stopped: {}", reason);
    }
    if let Some(duration) = summary.duration {
        println!("Duration: {:.2}s", duration.as_secs_f64());
    }
    println!();

    println!("Pages:");
    println!("  Attempted: {}", summary.pages_attempted);
    println!(
        "  Retained: {} ({:.1}%)",
        summary.pages_retained,
        summary.retention_rate()
    );
    println!("  Skipped: {}", summary.pages_skipped());
    if summary.pages_cancelled > 0 {
        println!("  Cancelled: {}", summary.pages_cancelled);
    }
    println!();

    println!("Content:");
    println!(
        "  Blocks retained: {} of {} scored",
        summary.blocks_retained, summary.blocks_scored
    );
    println!("  Media saved: {}", summary.media_saved);
    if summary.semantic_scoring {
        println!("  Semantic scoring: used");
    }
    println!();

    if !summary.skipped.is_empty() {
        println!("Skipped Pages:");
        for reason in SkipReason::all() {
            let pages = summary.skipped_by_reason(reason);
            if pages.is_empty() {
                continue;
            }
            println!("  {} ({}):", reason, pages.len());
            for page in pages {
                println!("    - {} ({})", page.url, page.detail);
            }
        }
        println!();
    }
}
