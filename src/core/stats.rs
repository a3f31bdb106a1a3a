//! Statistics tracking and run summaries

use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::catalog::Project;
use crate::core::config::{
    ERROR_MESSAGE_MAX_LENGTH, ERROR_MESSAGE_TRUNCATE_LENGTH, NAME_DISPLAY_WIDTH,
    PATH_DISPLAY_WIDTH,
};
use crate::git::{OutcomeKind, SyncOutcome};

/// Live counters, bumped by tasks as they finish
///
/// Only drives progress display. The authoritative per-project results are
/// collected by the scheduler into a [`RunSummary`].
#[derive(Debug, Default)]
pub struct SyncStatistics {
    pub cloned: AtomicU64,
    pub updated: AtomicU64,
    pub skipped: AtomicU64,
    pub failed: AtomicU64,
    pub timed_out: AtomicU64,
}

impl SyncStatistics {
    /// Creates a new statistics tracker with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one finished project
    pub fn record(&self, outcome: &SyncOutcome) {
        self.counter(outcome.kind()).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, kind: OutcomeKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    /// Number of projects with an outcome so far
    pub fn completed(&self) -> u64 {
        [
            OutcomeKind::Cloned,
            OutcomeKind::Updated,
            OutcomeKind::Skipped,
            OutcomeKind::Failed,
            OutcomeKind::TimedOut,
        ]
        .into_iter()
        .map(|kind| self.get(kind))
        .sum()
    }

    fn counter(&self, kind: OutcomeKind) -> &AtomicU64 {
        match kind {
            OutcomeKind::Cloned => &self.cloned,
            OutcomeKind::Updated => &self.updated,
            OutcomeKind::Skipped => &self.skipped,
            OutcomeKind::Failed => &self.failed,
            OutcomeKind::TimedOut => &self.timed_out,
        }
    }

    /// One-line progress footer
    pub fn generate_summary(&self, duration: Duration) -> String {
        summary_line(
            "⏳ Running",
            duration,
            self.get(OutcomeKind::Cloned),
            self.get(OutcomeKind::Updated) + self.get(OutcomeKind::Skipped),
            self.get(OutcomeKind::Failed),
            self.get(OutcomeKind::TimedOut),
        )
    }
}

/// Outcome of one project in a finished run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectResult {
    pub project: Project,
    /// Local target, absent when the namespace could not be mapped
    pub target: Option<PathBuf>,
    pub outcome: SyncOutcome,
}

/// Aggregated result of a run: every project with its outcome
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub results: Vec<ProjectResult>,
    pub batches: usize,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
}

impl RunSummary {
    /// Summary of a run that had nothing to do
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            batches: 0,
            started_at: Local::now(),
            duration: Duration::ZERO,
        }
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome.kind() == kind)
            .count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Projects that ended Failed or TimedOut, in catalog order
    pub fn failures(&self) -> impl Iterator<Item = &ProjectResult> {
        self.results
            .iter()
            .filter(|result| !result.outcome.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Final one-line summary
    pub fn generate_summary(&self) -> String {
        summary_line(
            "✅ Completed",
            self.duration,
            self.count(OutcomeKind::Cloned) as u64,
            (self.count(OutcomeKind::Updated) + self.count(OutcomeKind::Skipped)) as u64,
            self.count(OutcomeKind::Failed) as u64,
            self.count(OutcomeKind::TimedOut) as u64,
        )
    }

    /// Tree listing of projects needing attention; empty when all succeeded
    pub fn generate_detailed_summary(&self) -> String {
        let mut lines = Vec::new();

        let failed: Vec<&ProjectResult> = self
            .results
            .iter()
            .filter(|result| matches!(result.outcome, SyncOutcome::Failed(_)))
            .collect();
        let timed_out: Vec<&ProjectResult> = self
            .results
            .iter()
            .filter(|result| result.outcome == SyncOutcome::TimedOut)
            .collect();

        // Failed projects get priority
        if !failed.is_empty() {
            lines.push(format!("🔴 FAILED PROJECTS ({})", failed.len()));
            for (i, result) in failed.iter().enumerate() {
                let tree_char = if i == failed.len() - 1 { "└─" } else { "├─" };
                let reason = clean_error_message(result.outcome.reason().unwrap_or_default());
                lines.push(format!(
                    "   {} {:name_width$} {:path_width$} # {}",
                    tree_char,
                    result.project.path_with_namespace(),
                    display_target(result),
                    reason,
                    name_width = NAME_DISPLAY_WIDTH,
                    path_width = PATH_DISPLAY_WIDTH,
                ));
            }
            lines.push(String::new()); // Add blank line
        }

        if !timed_out.is_empty() {
            lines.push(format!("🟡 TIMED OUT ({})", timed_out.len()));
            for (i, result) in timed_out.iter().enumerate() {
                let tree_char = if i == timed_out.len() - 1 { "└─" } else { "├─" };
                lines.push(format!(
                    "   {} {:name_width$} {}",
                    tree_char,
                    result.project.path_with_namespace(),
                    display_target(result),
                    name_width = NAME_DISPLAY_WIDTH,
                ));
            }
        }

        // Remove trailing blank line if it exists
        if lines.last() == Some(&String::new()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

fn display_target(result: &ProjectResult) -> String {
    match &result.target {
        Some(path) => crate::utils::shorten_path(&path.to_string_lossy(), PATH_DISPLAY_WIDTH),
        None => "-".to_string(),
    }
}

fn summary_line(
    label: &str,
    duration: Duration,
    cloned: u64,
    updated: u64,
    failed: u64,
    timed_out: u64,
) -> String {
    let mut summary = format!(
        "{} in {:.1}s • {} cloned • {} updated",
        label,
        duration.as_secs_f64(),
        cloned,
        updated
    );
    if failed > 0 {
        summary.push_str(&format!(" • {failed} failed"));
    }
    if timed_out > 0 {
        summary.push_str(&format!(" • {timed_out} timed out"));
    }
    summary
}

/// Cleans and formats error messages for display
pub(crate) fn clean_error_message(error: &str) -> String {
    // Replace newlines/tabs with spaces and collapse whitespace
    let cleaned = error.split_whitespace().collect::<Vec<_>>().join(" ");

    // Extract key error patterns
    if cleaned.contains("timed out") {
        "timeout".to_string()
    } else if cleaned.contains("Filesystem error") || cleaned.contains("cannot prepare") {
        // Keep the OS reason, drop the path
        let reason = cleaned.rsplit(": ").next().unwrap_or(&cleaned);
        format!("filesystem error: {reason}")
    } else if cleaned.contains("Permission denied (publickey")
        || cleaned.contains("Authentication failed")
        || cleaned.contains("could not read Username")
    {
        "authentication failed".to_string()
    } else if cleaned.contains("does not appear to be a git repository")
        || cleaned.contains("not found")
    {
        "repository not found".to_string()
    } else if cleaned.contains("already exists and is not an empty directory") {
        "target directory not empty".to_string()
    } else if cleaned.contains("Could not resolve host")
        || cleaned.contains("Connection")
        || cleaned.contains("network")
    {
        "network error".to_string()
    } else if cleaned.chars().count() > ERROR_MESSAGE_MAX_LENGTH {
        // Truncate long messages
        let truncated: String = cleaned.chars().take(ERROR_MESSAGE_TRUNCATE_LENGTH).collect();
        format!("{truncated}...")
    } else {
        cleaned
    }
}
