//! Git command execution bounded by per-call deadlines

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::Instant;

// Working-copy probes are local and fast; they get their own short budget
const GIT_PROBE_TIMEOUT_SECS: u64 = 30;

// Git command arguments
const GIT_IS_WORK_TREE_ARGS: &[&str] = &["rev-parse", "--is-inside-work-tree"];
const GIT_FETCH_ARGS: &[&str] = &["fetch", "--quiet", "origin"];
const GIT_CLONE_ARGS: &[&str] = &["clone", "--quiet", "--"];

const STAGING_SUFFIX: &str = ".glsync-clone";

/// Failure of a single git invocation
#[derive(Error, Debug)]
pub enum GitError {
    /// git could not be started or its pipes could not be read
    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
    /// git ran and exited unsuccessfully
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
    /// git was still running at its deadline and has been killed
    #[error("git {command} timed out")]
    TimedOut { command: String },
    /// The clone target or its staging directory could not be prepared
    #[error("cannot prepare {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GitError {
    fn workspace(path: &Path, source: std::io::Error) -> Self {
        GitError::Workspace {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Version-control capability used by the sync task
///
/// Implementations must honor `deadline`: when it passes, the underlying
/// operation is terminated and [`GitError::TimedOut`] returned. Deadlines are
/// per call, so concurrent calls never affect one another.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Returns true if `path` holds a usable working copy
    async fn is_working_copy(&self, path: &Path) -> bool;

    /// Fetches the default remote of the working copy at `path`
    async fn fetch(&self, path: &Path, deadline: Instant) -> Result<(), GitError>;

    /// Clones `url` into `path` (which may exist but must be empty)
    async fn clone_repo(&self, url: &str, path: &Path, deadline: Instant) -> Result<(), GitError>;
}

/// [`VersionControl`] backed by the `git` command line
#[derive(Clone, Copy, Debug, Default)]
pub struct GitCli;

#[async_trait]
impl VersionControl for GitCli {
    async fn is_working_copy(&self, path: &Path) -> bool {
        let dot_git = path.join(".git");
        let has_git_dir = match tokio::fs::metadata(&dot_git).await {
            Ok(meta) if meta.is_dir() => true,
            // Submodules and worktrees expose a .git file
            Ok(_) => is_git_file(&dot_git).await,
            Err(_) => false,
        };
        if !has_git_dir {
            return false;
        }

        let deadline = Instant::now() + Duration::from_secs(GIT_PROBE_TIMEOUT_SECS);
        matches!(
            run_git(path, GIT_IS_WORK_TREE_ARGS, deadline).await,
            Ok((true, stdout, _)) if stdout == "true"
        )
    }

    async fn fetch(&self, path: &Path, deadline: Instant) -> Result<(), GitError> {
        let result = run_git(path, GIT_FETCH_ARGS, deadline).await?;
        expect_success("fetch", result)
    }

    async fn clone_repo(&self, url: &str, path: &Path, deadline: Instant) -> Result<(), GitError> {
        if !is_empty_dir(path).await.map_err(|e| GitError::workspace(path, e))? {
            return Err(GitError::Command {
                command: "clone".to_string(),
                stderr: format!(
                    "destination path '{}' already exists and is not an empty directory",
                    path.display()
                ),
            });
        }

        // Leftover of a run that was interrupted mid-clone
        let staging = staging_path(path);
        remove_if_present(&staging)
            .await
            .map_err(|e| GitError::workspace(&staging, e))?;

        let staging_arg = staging.to_string_lossy();
        let mut args = Vec::from(GIT_CLONE_ARGS);
        args.push(url);
        args.push(staging_arg.as_ref());

        let workdir = path.parent().unwrap_or(path);
        let cloned = run_git(workdir, &args, deadline)
            .await
            .and_then(|result| expect_success("clone", result));
        if let Err(e) = cloned {
            if let Err(cleanup) = remove_if_present(&staging).await {
                tracing::warn!(path = %staging.display(), error = %cleanup, "failed to remove partial clone");
            }
            return Err(e);
        }

        // Only a complete clone ever appears at the target path
        match tokio::fs::remove_dir(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(GitError::workspace(path, e)),
        }
        tokio::fs::rename(&staging, path)
            .await
            .map_err(|e| GitError::workspace(path, e))
    }
}

/// Runs a git command in `path`, killing it if it is still running at `deadline`
/// Returns (success, stdout, stderr)
pub async fn run_git(
    path: &Path,
    args: &[&str],
    deadline: Instant,
) -> Result<(bool, String, String), GitError> {
    let command = args.first().copied().unwrap_or("git").to_string();

    let mut git = Command::new("git");
    git.args(args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // git leads its own group so its transport helpers can be killed with it
    #[cfg(unix)]
    {
        git.process_group(0);
    }
    let mut child = git.spawn()?;
    let mut group = ProcessGroup::new(child.id());

    let read_stdout = read_pipe(child.stdout.take());
    let read_stderr = read_pipe(child.stderr.take());

    let waited = tokio::time::timeout_at(
        deadline,
        futures::future::try_join3(child.wait(), read_stdout, read_stderr),
    )
    .await;

    match waited {
        Ok(Ok((status, stdout, stderr))) => {
            group.disarm();
            Ok((
                status.success(),
                stdout.trim().to_string(),
                stderr.trim().to_string(),
            ))
        }
        Ok(Err(e)) => Err(GitError::Io(e)),
        Err(_) => {
            // ssh or git-remote-https would otherwise outlive git and keep the connection open
            group.kill();
            if let Err(e) = child.start_kill() {
                tracing::debug!(command = %command, error = %e, "failed to kill timed out git process");
            }
            if let Err(e) = child.wait().await {
                tracing::debug!(command = %command, error = %e, "failed to reap timed out git process");
            }
            Err(GitError::TimedOut { command })
        }
    }
}

/// Process group of a spawned git, killed on drop unless disarmed
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: if cfg!(unix) { pid } else { None },
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        #[cfg(unix)]
        {
            // SAFETY: killpg only sends a signal; pgid names the group created at spawn
            if unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) } != 0 {
                tracing::debug!(
                    pgid,
                    error = %std::io::Error::last_os_error(),
                    "failed to kill git process group"
                );
            }
        }
        #[cfg(not(unix))]
        let _ = pgid;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

fn expect_success(command: &str, (success, _, stderr): (bool, String, String)) -> Result<(), GitError> {
    if success {
        Ok(())
    } else {
        Err(GitError::Command {
            command: command.to_string(),
            stderr,
        })
    }
}

async fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::read_dir(path).await {
        Ok(mut entries) => Ok(entries.next_entry().await?.is_none()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Hidden sibling a clone is written to before it is moved onto `target`
fn staging_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_default());
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Check if a .git file contains a gitdir reference
/// Only reads the first 5 lines
async fn is_git_file(path: &Path) -> bool {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content
            .lines()
            .take(5)
            .any(|line| line.trim_start().starts_with("gitdir:")),
        Err(_) => false,
    }
}
