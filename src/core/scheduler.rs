//! Batch scheduling of project syncs
//!
//! Projects are cut into consecutive batches. Every member of a batch is
//! spawned onto the runtime and gated by a semaphore shared across the whole
//! run, so at most `concurrency` syncs are in flight. The next batch is only
//! submitted once every task of the current one has produced its result.

use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::config::SyncConfig;
use super::stats::{ProjectResult, RunSummary, SyncStatistics};
use super::task::process_project;
use crate::catalog::Project;
use crate::git::{SyncOutcome, VersionControl};

/// A consecutive slice of the catalog, processed as one unit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position in the run
    pub index: usize,
    pub projects: Vec<Project>,
}

/// Splits `projects` into consecutive batches of at most `batch_size`
///
/// Catalog order is preserved and every project lands in exactly one batch.
pub fn partition(projects: Vec<Project>, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(projects.len().div_ceil(batch_size));
    let mut remaining = projects.into_iter().peekable();

    while remaining.peek().is_some() {
        let projects: Vec<Project> = remaining.by_ref().take(batch_size).collect();
        batches.push(Batch {
            index: batches.len(),
            projects,
        });
    }

    batches
}

/// Receives scheduler events for display; all methods default to no-ops
pub trait SyncObserver: Send + Sync {
    fn batch_started(&self, _batch: &Batch, _batch_count: usize) {}
    fn project_started(&self, _project: &Project) {}
    fn project_finished(&self, _result: &ProjectResult) {}
}

/// Knobs of a scheduler run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub base_dir: PathBuf,
    pub batch_size: usize,
    pub concurrency: usize,
    pub timeout: Duration,
}

impl From<&SyncConfig> for SchedulerOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            timeout: config.timeout,
        }
    }
}

pub struct BatchScheduler {
    context: TaskContext,
    batch_size: usize,
}

/// Everything a spawned task needs, cloned once per task
#[derive(Clone)]
struct TaskContext {
    vcs: Arc<dyn VersionControl>,
    semaphore: Arc<Semaphore>,
    statistics: Arc<SyncStatistics>,
    observer: Option<Arc<dyn SyncObserver>>,
    base_dir: PathBuf,
    timeout: Duration,
}

impl BatchScheduler {
    pub fn new(vcs: Arc<dyn VersionControl>, options: SchedulerOptions) -> Self {
        let context = TaskContext {
            vcs,
            semaphore: Arc::new(Semaphore::new(options.concurrency.max(1))),
            statistics: Arc::new(SyncStatistics::new()),
            observer: None,
            base_dir: options.base_dir,
            timeout: options.timeout,
        };
        Self {
            context,
            batch_size: options.batch_size,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.context.observer = Some(observer);
        self
    }

    /// Live counters, updated as each project finishes
    pub fn statistics(&self) -> Arc<SyncStatistics> {
        Arc::clone(&self.context.statistics)
    }

    /// Syncs every project, batch after batch, and returns one result per project
    pub async fn run(&self, projects: Vec<Project>) -> RunSummary {
        let started_at = Local::now();
        let start_time = std::time::Instant::now();
        let total = projects.len();

        let batches = partition(projects, self.batch_size);
        let batch_count = batches.len();
        let mut results = Vec::with_capacity(total);

        for batch in batches {
            tracing::debug!(
                batch = batch.index + 1,
                of = batch_count,
                size = batch.projects.len(),
                "starting batch"
            );
            if let Some(observer) = self.context.observer.as_ref() {
                observer.batch_started(&batch, batch_count);
            }

            let batch_results = self.run_batch(batch).await;
            results.extend(batch_results);
        }

        RunSummary {
            results,
            batches: batch_count,
            started_at,
            duration: start_time.elapsed(),
        }
    }

    async fn run_batch(&self, batch: Batch) -> Vec<ProjectResult> {
        let tasks: Vec<(Project, JoinHandle<ProjectResult>)> = batch
            .projects
            .into_iter()
            .map(|project| {
                let handle = tokio::spawn(run_task(self.context.clone(), project.clone()));
                (project, handle)
            })
            .collect();

        // Barrier: one slot per task, filled in catalog order
        let mut results = Vec::with_capacity(tasks.len());
        for (project, handle) in tasks {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let result = ProjectResult {
                        project,
                        target: None,
                        outcome: SyncOutcome::Failed(format!("sync task aborted: {e}")),
                    };
                    self.context.finish(&result);
                    result
                }
            };
            results.push(result);
        }

        results
    }
}

impl TaskContext {
    /// Counts one finished project and streams it to the log and the observer
    fn finish(&self, result: &ProjectResult) {
        self.statistics.record(&result.outcome);

        let project = result.project.path_with_namespace();
        let path = result
            .target
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();

        match &result.outcome {
            SyncOutcome::Failed(reason) => {
                tracing::warn!(project = %project, path = %path, reason = %reason, "project sync failed");
            }
            SyncOutcome::TimedOut => {
                tracing::warn!(project = %project, path = %path, reason = "deadline exceeded", "project sync timed out");
            }
            outcome => {
                tracing::info!(project = %project, outcome = outcome.text(), "project synced");
            }
        }

        if let Some(observer) = self.observer.as_ref() {
            observer.project_finished(result);
        }
    }
}

async fn run_task(context: TaskContext, project: Project) -> ProjectResult {
    let _permit = match Arc::clone(&context.semaphore).acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            let result = ProjectResult {
                project,
                target: None,
                outcome: SyncOutcome::Failed(format!("worker pool closed: {e}")),
            };
            context.finish(&result);
            return result;
        }
    };

    if let Some(observer) = context.observer.as_ref() {
        observer.project_started(&project);
    }

    let result = process_project(context.vcs.as_ref(), project, &context.base_dir, context.timeout).await;
    context.finish(&result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projects(count: usize) -> Vec<Project> {
        (0..count)
            .map(|i| Project::new(i as u64, &format!("acme/p{i}"), format!("url-{i}")))
            .collect()
    }

    #[test]
    fn test_partition_sizes() {
        let batches = partition(projects(25), 10);
        let sizes: Vec<usize> = batches.iter().map(|b| b.projects.len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        let indices: Vec<usize> = batches.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_partition_preserves_order_without_overlap() {
        let input = projects(7);
        let batches = partition(input.clone(), 3);
        let flattened: Vec<Project> = batches.into_iter().flat_map(|b| b.projects).collect();
        assert_eq!(flattened, input);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_partition_zero_batch_size_treated_as_one() {
        assert_eq!(partition(projects(3), 0).len(), 3);
    }
}
