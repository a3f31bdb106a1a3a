//! GitCli tests against local bare remotes

mod common;

use common::{create_bare_remote, is_git_available};
use glsync::git::{GitCli, GitError, VersionControl};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

fn soon() -> Instant {
    Instant::now() + Duration::from_secs(30)
}

#[tokio::test]
async fn test_clone_killed_at_deadline_leaves_target_retryable() {
    if !is_git_available() {
        eprintln!("Skipping: git not available");
        return;
    }

    let remotes = TempDir::new().unwrap();
    let mirror = TempDir::new().unwrap();
    let remote = create_bare_remote(remotes.path(), "api").unwrap();
    let url = remote.to_string_lossy();
    let target = mirror.path().join("api");
    std::fs::create_dir(&target).unwrap();

    // Deadline already passed: git is killed right after it starts
    let result = GitCli.clone_repo(&url, &target, Instant::now()).await;

    assert!(matches!(result, Err(GitError::TimedOut { .. })), "{result:?}");
    assert!(target.is_dir());
    assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    let leftovers: Vec<_> = std::fs::read_dir(mirror.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("api")]);
    assert!(!GitCli.is_working_copy(&target).await);

    GitCli.clone_repo(&url, &target, soon()).await.unwrap();

    assert!(target.join("README.md").is_file());
    assert!(GitCli.is_working_copy(&target).await);
    GitCli.fetch(&target, soon()).await.unwrap();
}

#[tokio::test]
async fn test_failed_clone_creates_nothing() {
    if !is_git_available() {
        eprintln!("Skipping: git not available");
        return;
    }

    let remotes = TempDir::new().unwrap();
    let mirror = TempDir::new().unwrap();
    let missing = remotes.path().join("ghost.git");
    let target = mirror.path().join("ghost");

    let result = GitCli
        .clone_repo(&missing.to_string_lossy(), &target, soon())
        .await;

    assert!(matches!(result, Err(GitError::Command { .. })), "{result:?}");
    assert_eq!(std::fs::read_dir(mirror.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_leftover_staging_directory_is_replaced() {
    if !is_git_available() {
        eprintln!("Skipping: git not available");
        return;
    }

    let remotes = TempDir::new().unwrap();
    let mirror = TempDir::new().unwrap();
    let remote = create_bare_remote(remotes.path(), "web").unwrap();
    let stale = mirror.path().join(".web.glsync-clone");
    std::fs::create_dir_all(stale.join(".git")).unwrap();
    let target = mirror.path().join("web");

    GitCli
        .clone_repo(&remote.to_string_lossy(), &target, soon())
        .await
        .unwrap();

    assert!(!stale.exists());
    assert!(GitCli.is_working_copy(&target).await);
}
