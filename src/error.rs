//! Error taxonomy for a mirror run
//!
//! Errors fall into two classes. Catalog errors (authentication, unknown root
//! group, listing failures) and configuration errors are fatal: the run stops
//! before any batch is scheduled. Everything else belongs to a single project
//! and is folded into that project's [`SyncOutcome`](crate::git::SyncOutcome).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for glsync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// The hosting service rejected our credentials.
    #[error("Authentication failed against {url}: {message}")]
    Authentication { url: String, message: String },

    /// The root group path does not exist (or is invisible to this token).
    #[error("Group '{path}' not found: {message}")]
    NotFound { path: String, message: String },

    /// The hosting service failed while listing projects.
    #[error("Failed to list projects of '{group}': {message}")]
    List { group: String, message: String },

    /// A target directory could not be created.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A namespace path that cannot be mapped safely below the base directory.
    #[error("Invalid namespace path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A git command could not be spawned or waited on.
    #[error("Git error: {0}")]
    Git(#[from] crate::git::GitError),
}

impl SyncError {
    /// Returns true for errors that must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Authentication { .. }
                | SyncError::NotFound { .. }
                | SyncError::List { .. }
                | SyncError::Config { .. }
        )
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        SyncError::Config {
            message: message.into(),
        }
    }
}

/// Convenience alias used across the library
pub type Result<T> = std::result::Result<T, SyncError>;
