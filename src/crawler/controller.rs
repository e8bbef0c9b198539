//! Crawl controller - frontier and visited-set bookkeeping
//!
//! The controller owns all crawl state: the FIFO frontier, the visited set,
//! the processed count and the lifecycle phase. It decides which discovered
//! URLs are admitted (same registrable domain, not yet seen, within the page
//! limit and depth bound) and hands URLs out in breadth-first discovery order.
//!
//! The coordinator shares one controller between workers behind a single
//! mutex; every method here is a short, non-blocking critical section.

use crate::config::CrawlConfig;
use crate::state::{CrawlPhase, TerminationReason};
use crate::url::{normalize_parsed, url_registrable_domain};
use crate::{ScrapyerError, UrlError};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in (or just taken from) the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// Normalized URL
    pub url: Url,

    /// Link distance from the seed (seed = 0)
    pub depth: u32,
}

/// Result of asking the controller for the next URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeue {
    /// Fetch this URL
    Url(QueuedUrl),

    /// Frontier is empty but pages in flight may still discover links
    Wait,

    /// No further URLs will be handed out
    Done(TerminationReason),
}

/// Crawl controller
#[derive(Debug)]
pub struct CrawlController {
    /// URLs already dequeued (successfully processed or not)
    visited: HashSet<Url>,

    /// Discovered-but-not-yet-fetched URLs in discovery order
    frontier: VecDeque<QueuedUrl>,

    /// Membership index for `frontier`
    queued: HashSet<Url>,

    /// Page limit (`Some(1)` in single-page mode)
    limit: Option<u32>,

    /// Pages handed out by `next()`
    processed_count: u32,

    /// Registrable domain of the seed
    root_domain: String,

    /// Whether discovered links may be enqueued at all
    follow_links: bool,

    /// Optional link-depth bound
    max_depth: Option<u32>,

    /// Pages handed out but not yet reported complete
    in_flight: usize,

    phase: CrawlPhase,
    termination: Option<TerminationReason>,
}

impl CrawlController {
    /// Creates a controller with the seed URL enqueued at depth 0
    ///
    /// With crawling disabled the controller degenerates to a single
    /// iteration: limit 1 and no link re-enqueue.
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed URL
    /// * `config` - Crawl configuration (enabled flag, limit, depth bound)
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Controller in the `Idle` phase
    /// * `Err(UrlError)` - The seed is not an http(s) URL with a host
    pub fn new(seed: &Url, config: &CrawlConfig) -> Result<Self, UrlError> {
        let seed = normalize_parsed(seed.clone())?;
        let root_domain = url_registrable_domain(&seed).ok_or(UrlError::MissingDomain)?;

        let (limit, follow_links) = if config.enabled {
            (config.limit, true)
        } else {
            (Some(1), false)
        };

        let mut frontier = VecDeque::new();
        let mut queued = HashSet::new();
        queued.insert(seed.clone());
        frontier.push_back(QueuedUrl {
            url: seed,
            depth: 0,
        });

        Ok(Self {
            visited: HashSet::new(),
            frontier,
            queued,
            limit,
            processed_count: 0,
            root_domain,
            follow_links,
            max_depth: config.max_depth,
            in_flight: 0,
            phase: CrawlPhase::Idle,
            termination: None,
        })
    }

    /// Decides whether a discovered URL may enter the frontier
    ///
    /// Returns false if:
    /// - link following is disabled (single-page mode)
    /// - the controller has terminated
    /// - the candidate is not http(s) or its registrable domain differs from
    ///   the seed's
    /// - its normalized form is already visited or queued
    /// - `processed + frontier >= limit` when a limit is set
    pub fn should_follow(&self, candidate: &Url) -> bool {
        if !self.follow_links || self.phase == CrawlPhase::Terminated {
            return false;
        }

        let normalized = match normalize_parsed(candidate.clone()) {
            Ok(url) => url,
            Err(_) => return false,
        };

        if url_registrable_domain(&normalized).as_deref() != Some(self.root_domain.as_str()) {
            return false;
        }

        if self.visited.contains(&normalized) || self.queued.contains(&normalized) {
            return false;
        }

        !self.frontier_at_capacity()
    }

    /// Enqueues a link discovered on a page at `source_depth`
    ///
    /// Returns true if the URL was admitted to the frontier.
    pub fn enqueue(&mut self, url: &Url, source_depth: u32) -> bool {
        let depth = source_depth.saturating_add(1);
        if self.max_depth.is_some_and(|max| depth > max) {
            return false;
        }

        if !self.should_follow(url) {
            return false;
        }

        let Ok(normalized) = normalize_parsed(url.clone()) else {
            return false;
        };

        self.queued.insert(normalized.clone());
        self.frontier.push_back(QueuedUrl {
            url: normalized,
            depth,
        });
        true
    }

    /// Enqueues every link found on one page, in document order
    ///
    /// Returns the number of links admitted.
    pub fn enqueue_links<'a, I>(&mut self, links: I, source_depth: u32) -> usize
    where
        I: IntoIterator<Item = &'a Url>,
    {
        links
            .into_iter()
            .filter(|link| self.enqueue(link, source_depth))
            .count()
    }

    /// Pops the next URL in FIFO discovery order
    ///
    /// The returned URL is marked visited and counted as processed before it
    /// is handed out, so it can never be dequeued twice. Once the limit is
    /// reached or the frontier drains with nothing in flight the controller
    /// terminates and every later call returns `Done`.
    pub fn next(&mut self) -> Dequeue {
        if let Some(reason) = self.termination {
            return Dequeue::Done(reason);
        }

        if self.limit_reached() {
            self.terminate(TerminationReason::LimitReached);
            return Dequeue::Done(TerminationReason::LimitReached);
        }

        match self.frontier.pop_front() {
            Some(queued) => {
                self.queued.remove(&queued.url);
                self.visited.insert(queued.url.clone());
                self.processed_count += 1;
                self.in_flight += 1;
                if self.phase == CrawlPhase::Idle {
                    self.phase = CrawlPhase::Running;
                }
                Dequeue::Url(queued)
            }
            None if self.in_flight > 0 => Dequeue::Wait,
            None => {
                self.terminate(TerminationReason::FrontierExhausted);
                Dequeue::Done(TerminationReason::FrontierExhausted)
            }
        }
    }

    /// Marks a URL as visited without dequeuing it
    ///
    /// Used for the final URL of a redirect chain so the target is not
    /// crawled a second time under its own name.
    pub fn mark_visited(&mut self, url: &Url) {
        let Ok(normalized) = normalize_parsed(url.clone()) else {
            return;
        };

        if self.queued.remove(&normalized) {
            self.frontier.retain(|q| q.url != normalized);
        }
        self.visited.insert(normalized);
    }

    /// Reports that one handed-out page has finished (whatever its outcome)
    pub fn complete(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Stops handing out URLs
    ///
    /// Idempotent: the first reason recorded wins.
    pub fn terminate(&mut self, reason: TerminationReason) {
        if self.transition(CrawlPhase::Terminated).is_ok() {
            self.termination = Some(reason);
        }
    }

    /// Moves the controller to a new phase
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Transition applied
    /// * `Err(ScrapyerError::InvalidTransition)` - Transition is not legal
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), ScrapyerError> {
        if !self.phase.can_transition_to(next) {
            return Err(ScrapyerError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    fn limit_reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.processed_count >= limit)
    }

    fn frontier_at_capacity(&self) -> bool {
        self.limit.is_some_and(|limit| {
            self.processed_count as usize + self.frontier.len() >= limit as usize
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn processed_count(&self) -> u32 {
        self.processed_count
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn follows_links(&self) -> bool {
        self.follow_links
    }

    /// Returns true if the URL has already been dequeued or marked visited
    pub fn is_visited(&self, url: &Url) -> bool {
        normalize_parsed(url.clone()).is_ok_and(|u| self.visited.contains(&u))
    }

    /// Returns true if the URL is waiting in the frontier
    pub fn is_queued(&self, url: &Url) -> bool {
        normalize_parsed(url.clone()).is_ok_and(|u| self.queued.contains(&u))
    }
}
