//! Project catalog: root group resolution and recursive project listing
//!
//! The hosting service is reached through the [`GroupApi`] trait so the
//! catalog logic (validation, de-duplication) does not depend on a particular
//! client. [`gitlab::GitLabClient`] is the production implementation.

pub mod gitlab;

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::{Result, SyncError};

pub use gitlab::{CloneProtocol, GitLabClient};

/// A resolved root group on the hosting service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootGroup {
    pub id: u64,
    pub full_path: String,
}

/// One remotely hosted repository
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    /// Opaque remote identity
    pub id: u64,
    /// Namespace path segments, e.g. `["acme", "platform", "api"]`
    pub namespace_path: Vec<String>,
    /// Protocol-specific clone address
    pub clone_url: String,
}

impl Project {
    /// Builds a project from a slash-separated namespace path
    pub fn new(id: u64, path_with_namespace: &str, clone_url: impl Into<String>) -> Self {
        Self {
            id,
            namespace_path: path_with_namespace
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            clone_url: clone_url.into(),
        }
    }

    /// Slash-joined namespace path, used as the display name
    pub fn path_with_namespace(&self) -> String {
        self.namespace_path.join("/")
    }
}

/// Capability of an authenticated hosting-service handle
#[async_trait]
pub trait GroupApi: Send + Sync {
    /// Verifies the credentials; fails with [`SyncError::Authentication`]
    async fn authenticate(&self) -> Result<()>;

    /// Looks up a group by its full path
    async fn group(&self, path: &str) -> Result<RootGroup>;

    /// Lists every project in `group` and in all of its nested subgroups
    async fn group_projects(&self, group: &RootGroup) -> Result<Vec<Project>>;
}

/// Resolves the root group and lists every project beneath it
pub struct ProjectCatalog<A> {
    api: A,
}

impl<A: GroupApi> ProjectCatalog<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Authenticates and resolves `root_path` to a group
    pub async fn resolve(&self, root_path: &str) -> Result<RootGroup> {
        let path = root_path.trim().trim_matches('/');
        if path.is_empty() {
            return Err(SyncError::NotFound {
                path: root_path.to_string(),
                message: "empty group path".to_string(),
            });
        }

        self.api.authenticate().await?;
        let group = self.api.group(path).await?;
        tracing::debug!(group = %group.full_path, id = group.id, "resolved root group");
        Ok(group)
    }

    /// Lists all projects under `root`, recursively, without duplicates
    ///
    /// Order follows the hosting service's listing and is stable within a run.
    pub async fn list_all_projects(&self, root: &RootGroup) -> Result<Vec<Project>> {
        let listed = self.api.group_projects(root).await?;
        let listed_count = listed.len();
        let projects = dedup_projects(listed);
        if projects.len() != listed_count {
            tracing::debug!(
                dropped = listed_count - projects.len(),
                "dropped duplicate catalog entries"
            );
        }
        Ok(projects)
    }
}

/// Keeps the first occurrence of each project id and namespace path
fn dedup_projects(projects: Vec<Project>) -> Vec<Project> {
    let mut seen_ids = HashSet::with_capacity(projects.len());
    let mut seen_paths = HashSet::with_capacity(projects.len());
    projects
        .into_iter()
        .filter(|project| {
            seen_ids.insert(project.id) && seen_paths.insert(project.namespace_path.clone())
        })
        .collect()
}
