//! Fetch-or-clone for a single project

use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

use super::planner::{ensure_directory, plan_path, LocalTarget};
use super::stats::ProjectResult;
use crate::catalog::Project;
use crate::git::{GitError, SyncOutcome, VersionControl};

/// Brings `target` up to date with `project`, bounded by `deadline`
///
/// An existing working copy is fetched and never re-cloned, even when the
/// fetch fails. Otherwise the project is cloned into `target`. Errors are
/// folded into the returned outcome. The working-copy check runs inside the
/// deadline too, so a stalled check also ends as `TimedOut`.
pub async fn sync_project(
    vcs: &dyn VersionControl,
    project: &Project,
    target: &LocalTarget,
    deadline: Instant,
) -> SyncOutcome {
    let path = target.path();

    let operation = async {
        if vcs.is_working_copy(path).await {
            tracing::debug!(project = %project.path_with_namespace(), "fetching existing working copy");
            match vcs.fetch(path, deadline).await {
                Ok(()) => SyncOutcome::Updated,
                Err(GitError::TimedOut { .. }) => SyncOutcome::TimedOut,
                Err(e) => SyncOutcome::Failed(format!("fetch failed: {e}")),
            }
        } else {
            tracing::debug!(project = %project.path_with_namespace(), "cloning");
            match vcs.clone_repo(&project.clone_url, path, deadline).await {
                Ok(()) => SyncOutcome::Cloned,
                Err(GitError::TimedOut { .. }) => SyncOutcome::TimedOut,
                Err(e) => SyncOutcome::Failed(format!("clone failed: {e}")),
            }
        }
    };

    // Dropping the operation drops any running git, whose process group is killed on drop
    tokio::time::timeout_at(deadline, operation)
        .await
        .unwrap_or(SyncOutcome::TimedOut)
}

/// Plans, prepares and syncs one project; the full unit of work of a task
///
/// The deadline starts once the directory exists, so time spent queued for a
/// worker slot does not count against it.
pub async fn process_project(
    vcs: &dyn VersionControl,
    project: Project,
    base_dir: &Path,
    timeout: Duration,
) -> ProjectResult {
    let target = match plan_path(base_dir, &project.namespace_path) {
        Ok(target) => target,
        Err(e) => {
            return ProjectResult {
                project,
                target: None,
                outcome: SyncOutcome::Failed(e.to_string()),
            }
        }
    };

    let outcome = match ensure_directory(&target).await {
        Ok(()) => sync_project(vcs, &project, &target, Instant::now() + timeout).await,
        Err(e) => SyncOutcome::Failed(e.to_string()),
    };

    ProjectResult {
        project,
        target: Some(target.path().to_path_buf()),
        outcome,
    }
}
