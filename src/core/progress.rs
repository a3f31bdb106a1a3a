//! Progress bar management for verbose mirror runs

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::config::{
    DEFAULT_PROGRESS_BAR_LENGTH, NAME_DISPLAY_WIDTH, PROGRESS_CHARS, PROGRESS_TEMPLATE,
};
use super::scheduler::{Batch, SyncObserver};
use super::stats::{clean_error_message, ProjectResult, SyncStatistics};
use crate::catalog::Project;

/// One progress line per project plus a live footer with the running totals
pub struct VerboseReporter {
    multi_progress: MultiProgress,
    progress_style: ProgressStyle,
    bars: Mutex<HashMap<u64, ProgressBar>>,
    separator: ProgressBar,
    footer: ProgressBar,
    statistics: Arc<SyncStatistics>,
    start_time: Instant,
}

impl VerboseReporter {
    pub fn new(statistics: Arc<SyncStatistics>) -> Result<Self> {
        let multi_progress = MultiProgress::new();
        let progress_style = create_progress_style()?;
        let separator = create_separator_progress_bar(&multi_progress)?;
        let footer = create_footer_progress_bar(&multi_progress)?;
        footer.set_message(statistics.generate_summary(std::time::Duration::ZERO));

        Ok(Self {
            multi_progress,
            progress_style,
            bars: Mutex::new(HashMap::new()),
            separator,
            footer,
            statistics,
            start_time: Instant::now(),
        })
    }

    /// Project lines stay above the separator and footer
    fn add_project_bar(&self, project_name: &str) -> ProgressBar {
        create_progress_bar(
            &self.multi_progress,
            &self.separator,
            &self.progress_style,
            project_name,
        )
    }

    /// Freezes the footer on the final totals
    pub fn finish(&self) {
        self.footer
            .finish_with_message(self.statistics.generate_summary(self.start_time.elapsed()));
    }
}

impl SyncObserver for VerboseReporter {
    fn batch_started(&self, batch: &Batch, batch_count: usize) {
        let _ = self.multi_progress.println(format!(
            "📦 Batch {}/{} ({} projects)",
            batch.index + 1,
            batch_count,
            batch.projects.len()
        ));
    }

    fn project_started(&self, project: &Project) {
        let pb = self.add_project_bar(&project.path_with_namespace());
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(project.id, pb);
        }
    }

    fn project_finished(&self, result: &ProjectResult) {
        let name = result.project.path_with_namespace();
        let pb = self
            .bars
            .lock()
            .ok()
            .and_then(|mut bars| bars.remove(&result.project.id))
            // Projects that never got a worker still deserve a line
            .unwrap_or_else(|| self.add_project_bar(&name));

        pb.set_prefix(format!(
            "{} {:width$}",
            result.outcome.symbol(),
            name,
            width = NAME_DISPLAY_WIDTH
        ));
        let message = match result.outcome.reason() {
            Some(reason) => format!("{}: {}", result.outcome.text(), clean_error_message(reason)),
            None => result.outcome.text().to_string(),
        };
        pb.finish_with_message(message);

        self.footer
            .set_message(self.statistics.generate_summary(self.start_time.elapsed()));
    }
}

/// Creates and configures a progress bar for a project
pub(crate) fn create_progress_bar(
    multi: &MultiProgress,
    before: &ProgressBar,
    style: &ProgressStyle,
    project_name: &str,
) -> ProgressBar {
    let pb = multi.insert_before(before, ProgressBar::new(DEFAULT_PROGRESS_BAR_LENGTH));
    pb.set_style(style.clone());
    pb.set_prefix(format!("🟡 {:width$}", project_name, width = NAME_DISPLAY_WIDTH));
    pb.set_message("syncing...");
    pb
}

pub(crate) fn create_progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)?
        .progress_chars(PROGRESS_CHARS))
}

/// Finished, blank bar used as visual spacing
pub(crate) fn create_separator_progress_bar(multi_progress: &MultiProgress) -> Result<ProgressBar> {
    let separator_pb = multi_progress.add(ProgressBar::new(0));
    separator_pb.set_style(ProgressStyle::default_bar().template(" ")?);
    separator_pb.finish();
    Ok(separator_pb)
}

pub(crate) fn create_footer_progress_bar(multi_progress: &MultiProgress) -> Result<ProgressBar> {
    let footer_pb = multi_progress.add(ProgressBar::new(0));
    footer_pb.set_style(ProgressStyle::default_bar().template("{wide_msg}")?);
    Ok(footer_pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::SyncOutcome;

    #[test]
    fn test_progress_style_template_is_valid() {
        assert!(create_progress_style().is_ok());
    }

    #[test]
    fn test_reporter_tracks_bars_per_project() {
        let statistics = Arc::new(SyncStatistics::new());
        let reporter = VerboseReporter::new(Arc::clone(&statistics)).unwrap();
        let project = Project::new(7, "acme/api", "git@example.com:acme/api.git");

        reporter.project_started(&project);
        assert_eq!(reporter.bars.lock().unwrap().len(), 1);

        let result = ProjectResult {
            project,
            target: None,
            outcome: SyncOutcome::Cloned,
        };
        statistics.record(&result.outcome);
        reporter.project_finished(&result);
        assert!(reporter.bars.lock().unwrap().is_empty());
        reporter.finish();
    }
}
