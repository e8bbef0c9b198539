//! Markdown summary generation
//!
//! This module renders a finished crawl summary as the `summary.md` file
//! written at the root of the archive.

use crate::output::summary::CrawlSummary;
use crate::state::SkipReason;

/// Formats a crawl summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Scrapyer Archive Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.to_rfc3339()
    ));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration {
        md.push_str(&format!(
            "- **Duration**: {:.2} seconds\n",
            duration.as_secs_f64()
        ));
    }
    if let Some(reason) = summary.termination {
        md.push_str(&format!("- **Stopped**: {}\n", reason));
    }
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Page counts
    md.push_str("## Pages\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Attempted | {} |\n", summary.pages_attempted));
    md.push_str(&format!("| Retained | {} |\n", summary.pages_retained));
    md.push_str(&format!("| Skipped | {} |\n", summary.pages_skipped()));
    if summary.pages_cancelled > 0 {
        md.push_str(&format!("| Cancelled | {} |\n", summary.pages_cancelled));
    }
    md.push_str(&format!(
        "\nRetention rate: {:.2}%\n\n",
        summary.retention_rate()
    ));

    // Content
    md.push_str("## Content\n\n");
    md.push_str(&format!("- **Blocks Scored**: {}\n", summary.blocks_scored));
    md.push_str(&format!(
        "- **Blocks Retained**: {}\n",
        summary.blocks_retained
    ));
    md.push_str(&format!("- **Media Saved**: {}\n", summary.media_saved));
    md.push_str(&format!(
        "- **Semantic Scoring**: {}\n\n",
        if summary.semantic_scoring { "yes" } else { "no" }
    ));

    if !summary.retained.is_empty() {
        md.push_str("## Retained Pages\n\n");
        md.push_str("| URL | Directory | Blocks | Media |\n");
        md.push_str("|-----|-----------|--------|-------|\n");
        for page in &summary.retained {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                page.url, page.fingerprint, page.blocks, page.media
            ));
        }
        md.push('\n');
    }

    if !summary.skipped.is_empty() {
        md.push_str("## Skipped Pages\n\n");
        for reason in SkipReason::all() {
            let pages = summary.skipped_by_reason(reason);
            if pages.is_empty() {
                continue;
            }
            md.push_str(&format!("### {} ({})\n\n", reason, pages.len()));
            for page in pages {
                md.push_str(&format!("- {}: {}\n", page.url, page.detail));
            }
            md.push('\n');
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::summary::PageReport;
    use crate::state::{PageOutcome, TerminationReason};
    use std::time::Duration;

    fn create_test_summary() -> CrawlSummary {
        let mut summary = CrawlSummary::new("https://example.com/", "/tmp/archive");
        summary.config_hash = Some("abc123".to_string());
        summary.record_page(PageReport {
            url: "https://example.com/".to_string(),
            fingerprint: "0123456789abcdef0123456789abcdef".to_string(),
            outcome: PageOutcome::Retained {
                blocks: 4,
                media: 2,
            },
            blocks_scored: 10,
            used_semantic: false,
        });
        summary.record_page(PageReport {
            url: "https://example.com/missing".to_string(),
            fingerprint: "ffffffffffffffffffffffffffffffff".to_string(),
            outcome: PageOutcome::skipped(SkipReason::FatalFailure, "HTTP 404"),
            blocks_scored: 0,
            used_semantic: false,
        });
        summary.finish(TerminationReason::FrontierExhausted, Duration::from_secs(2));
        summary
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# Scrapyer Archive Summary"));
        assert!(markdown.contains("- **Seed**: https://example.com/"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Stopped**: frontier exhausted"));
    }

    #[test]
    fn test_markdown_contains_counts() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("| Attempted | 2 |"));
        assert!(markdown.contains("| Retained | 1 |"));
        assert!(markdown.contains("| Skipped | 1 |"));
        assert!(markdown.contains("Retention rate: 50.00%"));
        assert!(markdown.contains("- **Blocks Retained**: 4"));
        assert!(markdown.contains("- **Media Saved**: 2"));
        assert!(!markdown.contains("Cancelled"));
    }

    #[test]
    fn test_markdown_lists_pages() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown
            .contains("| https://example.com/ | 0123456789abcdef0123456789abcdef | 4 | 2 |"));
        assert!(markdown.contains("### fatal fetch failure (1)"));
        assert!(markdown.contains("- https://example.com/missing: HTTP 404"));
    }
}
