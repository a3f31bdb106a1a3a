//! Public API for git operations.
//!
//! This module provides the stable public API for git-related functionality:
//! - The [`VersionControl`] capability and its `git` CLI implementation
//! - Per-project [`SyncOutcome`] values
//!
//! ## Example: Probing a working copy
//!
//! ```rust,no_run
//! use glsync::git::{GitCli, VersionControl};
//! use std::path::Path;
//!
//! async fn check(path: &Path) {
//!     if GitCli.is_working_copy(path).await {
//!         println!("{} is a working copy", path.display());
//!     }
//! }
//! ```

pub use super::operations::{run_git, GitCli, GitError, VersionControl};
pub use super::status::{OutcomeKind, SyncOutcome};
