/// Lifecycle phase definitions for the crawl controller
use std::fmt;

/// The controller's lifecycle phase
///
/// `Idle → Running → Terminated`. There is no transition out of `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Created, seed enqueued, nothing dequeued yet
    Idle,

    /// At least one URL has been handed out
    Running,

    /// No further URLs will be handed out
    Terminated,
}

impl CrawlPhase {
    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Terminated)
                | (Self::Running, Self::Terminated)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the controller stopped handing out URLs
///
/// These are normal termination signals, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// Every discovered URL has been processed
    FrontierExhausted,

    /// The configured page limit was reached
    LimitReached,

    /// The global crawl timeout fired
    TimedOut,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "frontier exhausted",
            Self::LimitReached => "page limit reached",
            Self::TimedOut => "crawl timeout",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
