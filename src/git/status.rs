//! Per-project sync outcome and its display helpers

use std::fmt;

/// Result of synchronizing one project, produced exactly once per run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No working copy existed; the project was cloned
    Cloned,
    /// An existing working copy was fetched
    Updated,
    /// Working copy already current (reserved; fetch reports `Updated`)
    Skipped,
    /// Directory creation, clone or fetch failed
    Failed(String),
    /// The clone or fetch outlived its deadline and was killed
    TimedOut,
}

/// Outcome discriminant used for counting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeKind {
    Cloned,
    Updated,
    Skipped,
    Failed,
    TimedOut,
}

impl SyncOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            SyncOutcome::Cloned => OutcomeKind::Cloned,
            SyncOutcome::Updated => OutcomeKind::Updated,
            SyncOutcome::Skipped => OutcomeKind::Skipped,
            SyncOutcome::Failed(_) => OutcomeKind::Failed,
            SyncOutcome::TimedOut => OutcomeKind::TimedOut,
        }
    }

    /// True for outcomes that left a usable working copy behind
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Cloned | SyncOutcome::Updated | SyncOutcome::Skipped
        )
    }

    /// Returns the emoji symbol for this outcome
    pub fn symbol(&self) -> &str {
        match self {
            SyncOutcome::Cloned | SyncOutcome::Updated => "🟢",
            SyncOutcome::Skipped => "🟠",
            SyncOutcome::TimedOut => "🟡",
            SyncOutcome::Failed(_) => "🔴",
        }
    }

    /// Returns the text representation of this outcome
    pub fn text(&self) -> &str {
        match self {
            SyncOutcome::Cloned => "cloned",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::Failed(_) => "failed",
            SyncOutcome::TimedOut => "timed-out",
        }
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            SyncOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.text()),
        }
    }
}
