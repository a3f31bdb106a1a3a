//! Maps project namespaces onto the local mirror tree

use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Local directory that mirrors one project
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalTarget {
    path: PathBuf,
}

impl LocalTarget {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Derives the local target of a namespace path below `base_dir`
///
/// Deterministic and free of I/O. Segments that would escape `base_dir`
/// (`..`, `.`, separators, NUL) are rejected.
pub fn plan_path(base_dir: &Path, namespace_path: &[String]) -> Result<LocalTarget> {
    let invalid = |reason: &str| SyncError::InvalidPath {
        path: namespace_path.join("/"),
        reason: reason.to_string(),
    };

    if namespace_path.is_empty() {
        return Err(invalid("empty namespace"));
    }

    let mut path = base_dir.to_path_buf();
    for segment in namespace_path {
        match segment.as_str() {
            "" => return Err(invalid("empty segment")),
            "." | ".." => return Err(invalid("relative segment")),
            s if s.contains(|c: char| matches!(c, '/' | '\\' | '\0')) => {
                return Err(invalid("separator in segment"))
            }
            s => path.push(s),
        }
    }

    Ok(LocalTarget { path })
}

/// Creates the target directory and any missing parents
///
/// Succeeds silently if it already exists.
pub async fn ensure_directory(target: &LocalTarget) -> Result<()> {
    tokio::fs::create_dir_all(&target.path)
        .await
        .map_err(|source| SyncError::Filesystem {
            path: target.path.clone(),
            source,
        })
}
