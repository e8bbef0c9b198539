//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Aggregating per-page outcomes into a crawl summary
//! - Printing the summary to the console
//! - Rendering the markdown summary stored with the archive

mod markdown;
mod summary;

pub use markdown::format_markdown_summary;
pub use summary::{print_summary, CrawlSummary, PageReport, RetainedPage, SkippedPage};
