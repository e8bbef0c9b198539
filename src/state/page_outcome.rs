/// Per-page outcome definitions for the crawl summary
use std::fmt;

/// Why a page was attempted but not archived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// Retryable failures (timeout, connection, 5xx) outlasted every attempt
    TransientFailure,

    /// TLS verification failure, 4xx, malformed URL: no retry
    FatalFailure,

    /// Response was not HTML or XML
    UnsupportedContent,

    /// Document could not be parsed into blocks
    ParseError,

    /// Every block was dropped by the pre-filter or the quality scorer
    NoRetainedContent,

    /// The page directory could not be written
    StorageFailure,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientFailure => "transient fetch failure",
            Self::FatalFailure => "fatal fetch failure",
            Self::UnsupportedContent => "unsupported content type",
            Self::ParseError => "parse error",
            Self::NoRetainedContent => "no retained content",
            Self::StorageFailure => "storage failure",
        }
    }

    /// Returns all skip reasons in report order
    pub fn all() -> [Self; 6] {
        [
            Self::TransientFailure,
            Self::FatalFailure,
            Self::UnsupportedContent,
            Self::ParseError,
            Self::NoRetainedContent,
            Self::StorageFailure,
        ]
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of one dequeued page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// At least one block (or media asset) was written to the page directory
    Retained {
        blocks: usize,
        media: usize,
    },

    /// Page was visited but nothing was archived
    Skipped {
        reason: SkipReason,
        detail: String,
    },
}

impl PageOutcome {
    pub fn skipped(reason: SkipReason, detail: impl Into<String>) -> Self {
        Self::Skipped {
            reason,
            detail: detail.into(),
        }
    }

    /// Returns true if the page produced an archive directory
    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Retained { .. })
    }

    /// Returns the skip reason, if the page was skipped
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped { reason, .. } => Some(*reason),
            Self::Retained { .. } => None,
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retained { blocks, media } => {
                write!(f, "retained ({} blocks, {} media)", blocks, media)
            }
            Self::Skipped { reason, detail } => write!(f, "skipped: {} ({})", reason, detail),
        }
    }
}
