//! Common test utilities and helpers
#![allow(dead_code, unused_imports)]

pub mod fakes;
pub mod git;

pub use self::fakes::{Behavior, CatalogFailure, FakeGroupApi, FakeVcs, RecordingObserver, VcsEvent};
pub use self::git::{create_bare_remote, is_git_available, setup_git_repo};

use glsync::catalog::CloneProtocol;
use glsync::core::{GitLabSettings, SyncConfig};
use std::path::Path;
use std::time::Duration;

/// A run config for tests; no real server is contacted
pub fn test_config(base_dir: &Path, root_group: &str) -> SyncConfig {
    SyncConfig {
        base_dir: base_dir.to_path_buf(),
        root_group: root_group.to_string(),
        batch_size: 10,
        timeout: Duration::from_secs(30),
        concurrency: 4,
        protocol: CloneProtocol::Ssh,
        gitlab: GitLabSettings {
            url: "https://gitlab.example.com".to_string(),
            token: "test-token".to_string(),
        },
        strict: false,
    }
}
