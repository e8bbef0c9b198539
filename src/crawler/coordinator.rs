//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the archiving process, including:
//! - Building the fetcher, extractor, scorer and archive from configuration
//! - Running a bounded pool of page workers over the shared controller
//! - Enforcing the global crawl timeout
//! - Recording per-page outcomes and writing the summary

use crate::config::{validate_seed_url, Config};
use crate::crawler::controller::{CrawlController, Dequeue, QueuedUrl};
use crate::crawler::extractor::{
    ContentExtractor, ExtractError, ExtractOptions, Extraction, MediaRef,
};
use crate::crawler::fetcher::{FetchError, FetchErrorKind, FetchPolicy, Fetcher};
use crate::crawler::media::download_media;
use crate::output::{format_markdown_summary, CrawlSummary, PageReport};
use crate::quality::{provider_from_config, EmbeddingProvider, FilterOutcome, QualityScorer};
use crate::state::{PageOutcome, SkipReason, TerminationReason};
use crate::storage::{ArchiveStore, FsArchiveStore, PageRecord};
use crate::url::content_fingerprint;
use crate::{ConfigError, ScrapyerError};
use chrono::Utc;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    seed: Url,
    config_hash: Option<String>,
    ctx: PageContext,
}

/// Everything a page worker needs, cheap to clone per task
#[derive(Clone)]
struct PageContext {
    controller: Arc<Mutex<CrawlController>>,
    fetcher: Fetcher,
    extractor: Arc<ContentExtractor>,
    scorer: Arc<QualityScorer>,
    store: Arc<dyn ArchiveStore>,
}

/// Extraction and scoring results for one page
struct ProcessedContent {
    title: Option<String>,
    links: Vec<Url>,
    media: Vec<MediaRef>,
    filtered: FilterOutcome,
    final_url: Url,
    status: u16,
}

impl Coordinator {
    /// Creates a coordinator writing to a directory archive
    ///
    /// # Arguments
    ///
    /// * `config` - Validated archiver configuration
    /// * `seed` - Seed URL as given on the command line
    /// * `output` - Archive root; created if its parent exists
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ScrapyerError)` - Invalid seed URL, output target or trust material
    pub fn new(config: Config, seed: &str, output: &Path) -> Result<Self, ScrapyerError> {
        let seed = validate_seed_url(seed)?;
        let store = FsArchiveStore::open(output)
            .map_err(|e| ConfigError::OutputTarget(e.to_string()))?;

        let provider = if config.quality.enabled && config.quality.nlp_enabled {
            provider_from_config(&config.embedding)
        } else {
            None
        };

        Self::with_components(config, seed, Arc::new(store), provider)
    }

    /// Creates a coordinator from already-built collaborators
    pub fn with_components(
        config: Config,
        seed: Url,
        store: Arc<dyn ArchiveStore>,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, ScrapyerError> {
        let controller = CrawlController::new(&seed, &config.crawl)?;
        let policy =
            FetchPolicy::from_config(&config.fetch).within_domain(controller.root_domain());
        let fetcher = Fetcher::new(policy)?;
        let extractor = ContentExtractor::new(ExtractOptions::from_config(&config.extract));
        let scorer = QualityScorer::new(&config.quality, provider);

        tracing::debug!(
            "Coordinator ready: root domain {}, limit {:?}, semantic scoring {}",
            controller.root_domain(),
            controller.limit(),
            scorer.semantic_enabled()
        );

        Ok(Self {
            config,
            seed,
            config_hash: None,
            ctx: PageContext {
                controller: Arc::new(Mutex::new(controller)),
                fetcher,
                extractor: Arc::new(extractor),
                scorer: Arc::new(scorer),
                store,
            },
        })
    }

    /// Records the config file hash in the summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Runs the crawl to completion
    ///
    /// Pages are dequeued in breadth-first order and processed by up to
    /// `workers` concurrent tasks. The loop ends when the controller reports
    /// `Done` with nothing in flight, or when the global timeout fires, in
    /// which case outstanding pages are aborted.
    ///
    /// # Returns
    ///
    /// The crawl summary. Per-page failures are recorded in it, never
    /// returned as errors.
    pub async fn run(self) -> Result<CrawlSummary, ScrapyerError> {
        let start = Instant::now();
        let workers = self.config.crawl.workers.max(1) as usize;
        let deadline = self
            .config
            .crawl
            .timeout_secs
            .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

        let mut summary = CrawlSummary::new(self.seed.as_str(), self.ctx.store.root());
        summary.config_hash = self.config_hash.clone();

        tracing::info!(
            "Archiving {} into {} ({} workers)",
            self.seed,
            self.ctx.store.root().display(),
            workers
        );

        let mut tasks: JoinSet<PageReport> = JoinSet::new();
        let mut completed: u64 = 0;

        loop {
            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                cancel_in_flight(&self.ctx.controller, &mut tasks, &mut summary).await;
                break;
            }

            while tasks.len() < workers {
                let next = lock(&self.ctx.controller).next();
                match next {
                    Dequeue::Url(queued) => {
                        tracing::debug!("Dequeued {} (depth {})", queued.url, queued.depth);
                        tasks.spawn(process_page(self.ctx.clone(), queued));
                    }
                    Dequeue::Wait | Dequeue::Done(_) => break,
                }
            }

            if tasks.is_empty() {
                break;
            }

            let joined = match deadline {
                Some(deadline) => tokio::select! {
                    biased;
                    _ = tokio::time::sleep_until(deadline) => None,
                    joined = tasks.join_next() => Some(joined),
                },
                None => Some(tasks.join_next().await),
            };

            let Some(joined) = joined else {
                cancel_in_flight(&self.ctx.controller, &mut tasks, &mut summary).await;
                break;
            };

            lock(&self.ctx.controller).complete();

            match joined {
                Some(Ok(report)) => summary.record_page(report),
                Some(Err(e)) => {
                    tracing::error!("Page worker failed: {}", e);
                    summary.record_cancelled();
                }
                None => continue,
            }

            completed += 1;
            if completed % 10 == 0 {
                let rate = completed as f64 / start.elapsed().as_secs_f64();
                let controller = lock(&self.ctx.controller);
                tracing::info!(
                    "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
                    completed,
                    controller.frontier_len(),
                    rate
                );
            }
        }

        let termination = {
            let mut controller = lock(&self.ctx.controller);
            controller.terminate(TerminationReason::FrontierExhausted);
            controller
                .termination()
                .unwrap_or(TerminationReason::FrontierExhausted)
        };
        summary.finish(termination, start.elapsed());

        tracing::info!(
            "Crawl finished ({}): {} attempted, {} retained, {} skipped in {:?}",
            termination,
            summary.pages_attempted,
            summary.pages_retained,
            summary.pages_skipped(),
            start.elapsed()
        );

        if let Err(e) = self
            .ctx
            .store
            .store_summary(&format_markdown_summary(&summary))
        {
            tracing::warn!("Failed to write summary: {}", e);
        }

        Ok(summary)
    }
}

/// Ends the crawl on the global timeout, aborting every in-flight page
async fn cancel_in_flight(
    controller: &Mutex<CrawlController>,
    tasks: &mut JoinSet<PageReport>,
    summary: &mut CrawlSummary,
) {
    tracing::warn!(
        "Crawl timeout reached, cancelling {} in-flight pages",
        tasks.len()
    );
    lock(controller).terminate(TerminationReason::TimedOut);
    tasks.abort_all();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => summary.record_page(report),
            Err(_) => summary.record_cancelled(),
        }
    }
}

/// Locks the controller, recovering the state if a worker panicked
fn lock(controller: &Mutex<CrawlController>) -> MutexGuard<'_, CrawlController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Maps a terminal fetch failure to the reason reported in the summary
fn skip_reason(err: &FetchError) -> SkipReason {
    match err.kind() {
        FetchErrorKind::UnsupportedContent => SkipReason::UnsupportedContent,
        _ if err.is_retryable() => SkipReason::TransientFailure,
        _ => SkipReason::FatalFailure,
    }
}

/// Processes a single dequeued page
///
/// This function:
/// 1. Fetches the page through the retry policy
/// 2. Extracts and scores blocks off the async runtime
/// 3. Enqueues discovered links
/// 4. Downloads media
/// 5. Writes the page directory when anything was retained
async fn process_page(ctx: PageContext, queued: QueuedUrl) -> PageReport {
    let fingerprint = content_fingerprint(&queued.url);
    let report = |outcome: PageOutcome, blocks_scored: usize, used_semantic: bool| PageReport {
        url: queued.url.to_string(),
        fingerprint: fingerprint.clone(),
        outcome,
        blocks_scored,
        used_semantic,
    };

    let fetched = ctx.fetcher.fetch(&queued.url).await;
    if fetched.was_redirected() {
        tracing::debug!("{} redirected to {}", queued.url, fetched.final_url);
        lock(&ctx.controller).mark_visited(&fetched.final_url);
    }

    if let Err(e) = &fetched.outcome {
        let reason = skip_reason(e);
        tracing::warn!(
            "Skipping {} after {} attempt(s): {}",
            queued.url,
            fetched.attempts,
            e
        );
        return report(PageOutcome::skipped(reason, e.to_string()), 0, false);
    }

    let extractor = Arc::clone(&ctx.extractor);
    let scorer = Arc::clone(&ctx.scorer);
    let processed = tokio::task::spawn_blocking(move || -> Result<_, ExtractError> {
        let status = fetched.status().unwrap_or_default();
        let Extraction {
            title,
            blocks,
            links,
            media,
        } = extractor.extract(&fetched)?;
        Ok(ProcessedContent {
            title,
            links,
            media,
            filtered: scorer.filter_blocks(blocks),
            final_url: fetched.final_url,
            status,
        })
    })
    .await;

    let content = match processed {
        Ok(Ok(content)) => content,
        Ok(Err(e)) => {
            tracing::warn!("Failed to parse {}: {}", queued.url, e);
            return report(PageOutcome::skipped(SkipReason::ParseError, e.to_string()), 0, false);
        }
        Err(e) => {
            tracing::error!("Extraction task failed for {}: {}", queued.url, e);
            return report(PageOutcome::skipped(SkipReason::ParseError, e.to_string()), 0, false);
        }
    };

    let scored = content.filtered.scored;
    let used_semantic = content.filtered.used_semantic;

    let enqueued = lock(&ctx.controller).enqueue_links(content.links.iter(), queued.depth);
    tracing::debug!(
        "{}: {} links found, {} enqueued",
        queued.url,
        content.links.len(),
        enqueued
    );

    let media_saved = if content.media.is_empty() {
        0
    } else {
        download_media(&ctx.fetcher, ctx.store.as_ref(), &fingerprint, &content.media).await
    };

    let blocks = content.filtered.retained.len();
    if blocks == 0 && media_saved == 0 {
        let detail = if scored > 0 {
            format!("0 of {} blocks passed the quality threshold", scored)
        } else {
            "no text blocks extracted".to_string()
        };
        tracing::warn!("Skipping {}: {}", queued.url, detail);
        return report(
            PageOutcome::skipped(SkipReason::NoRetainedContent, detail),
            scored,
            used_semantic,
        );
    }

    let record = PageRecord {
        url: queued.url.clone(),
        final_url: content.final_url,
        content_fingerprint: fingerprint.clone(),
        title: content.title,
        status: content.status,
        fetched_at: Utc::now(),
        retained_blocks: content.filtered.retained,
        blocks_scored: scored,
        discovered_links: content.links,
        media_saved,
        used_semantic,
    };

    match ctx.store.store_page(record) {
        Ok(dir) => {
            tracing::info!(
                "Archived {} ({} blocks, {} media) to {}",
                queued.url,
                blocks,
                media_saved,
                dir.display()
            );
            report(
                PageOutcome::Retained {
                    blocks,
                    media: media_saved,
                },
                scored,
                used_semantic,
            )
        }
        Err(e) => {
            tracing::warn!("Failed to store {}: {}", queued.url, e);
            report(
                PageOutcome::skipped(SkipReason::StorageFailure, e.to_string()),
                scored,
                used_semantic,
            )
        }
    }
}
