//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the controller lifecycle (`Idle → Running → Terminated`)
//! - `TerminationReason`: normal end-of-crawl signals
//! - `PageOutcome` / `SkipReason`: what happened to each dequeued page

mod crawl_phase;
mod page_outcome;

pub use crawl_phase::{CrawlPhase, TerminationReason};
pub use page_outcome::{PageOutcome, SkipReason};
