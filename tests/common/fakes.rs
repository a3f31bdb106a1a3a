//! In-memory stand-ins for the hosting service and for git

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use glsync::catalog::{GroupApi, Project, RootGroup};
use glsync::core::{Batch, ProjectResult, SyncObserver};
use glsync::error::{Result, SyncError};
use glsync::git::{GitError, VersionControl};

/// How the fake catalog misbehaves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogFailure {
    Unauthorized,
    ListingFails,
}

/// A group tree held in memory
///
/// Listing a group returns every project whose path lies below it, in
/// insertion order, like the recursive listing of the real service.
#[derive(Default)]
pub struct FakeGroupApi {
    groups: Vec<RootGroup>,
    projects: Vec<Project>,
    failure: Option<CatalogFailure>,
    duplicate_first: bool,
    pub list_calls: AtomicUsize,
}

impl FakeGroupApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, id: u64, full_path: &str) -> Self {
        self.groups.push(RootGroup {
            id,
            full_path: full_path.to_string(),
        });
        self
    }

    pub fn project(mut self, id: u64, path: &str, clone_url: &str) -> Self {
        self.projects.push(Project::new(id, path, clone_url));
        self
    }

    /// Lists the first project twice, as a paginated listing can
    pub fn with_duplicate_entry(mut self) -> Self {
        self.duplicate_first = true;
        self
    }

    pub fn failing(mut self, failure: CatalogFailure) -> Self {
        self.failure = Some(failure);
        self
    }
}

#[async_trait]
impl GroupApi for FakeGroupApi {
    async fn authenticate(&self) -> Result<()> {
        if self.failure == Some(CatalogFailure::Unauthorized) {
            return Err(SyncError::Authentication {
                url: "https://gitlab.example.com".to_string(),
                message: "401 Unauthorized".to_string(),
            });
        }
        Ok(())
    }

    async fn group(&self, path: &str) -> Result<RootGroup> {
        self.groups
            .iter()
            .find(|group| group.full_path == path)
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                path: path.to_string(),
                message: "404 Group Not Found".to_string(),
            })
    }

    async fn group_projects(&self, group: &RootGroup) -> Result<Vec<Project>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failure == Some(CatalogFailure::ListingFails) {
            return Err(SyncError::List {
                group: group.full_path.clone(),
                message: "500 Internal Server Error".to_string(),
            });
        }

        let prefix = format!("{}/", group.full_path);
        let mut listed: Vec<Project> = self
            .projects
            .iter()
            .filter(|project| project.path_with_namespace().starts_with(&prefix))
            .cloned()
            .collect();
        if self.duplicate_first {
            if let Some(first) = listed.first().cloned() {
                listed.push(first);
            }
        }
        Ok(listed)
    }
}

/// What the fake git does for one clone URL
#[derive(Clone, Debug)]
pub enum Behavior {
    Succeed(Duration),
    Fail(&'static str),
    Hang,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VcsEvent {
    Started(String),
    Finished(String),
}

/// Fake git that records ordering and peak parallelism
///
/// A successful clone turns the target into a working copy, so a second
/// run over the same paths fetches.
pub struct FakeVcs {
    default_behavior: Behavior,
    behaviors: HashMap<String, Behavior>,
    working_copies: Mutex<HashMap<PathBuf, String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub events: Mutex<Vec<VcsEvent>>,
}

impl FakeVcs {
    pub fn new(default_behavior: Behavior) -> Self {
        Self {
            default_behavior,
            behaviors: HashMap::new(),
            working_copies: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, clone_url: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(clone_url.to_string(), behavior);
        self
    }

    pub fn events(&self) -> Vec<VcsEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> HashSet<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                VcsEvent::Started(url) => Some(url),
                VcsEvent::Finished(_) => None,
            })
            .collect()
    }

    async fn perform(&self, url: &str, deadline: Instant) -> std::result::Result<(), GitError> {
        self.events.lock().unwrap().push(VcsEvent::Started(url.to_string()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let behavior = self
            .behaviors
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default_behavior.clone());
        let timed_out = || GitError::TimedOut {
            command: format!("fake {url}"),
        };
        let result = match behavior {
            Behavior::Succeed(duration) => tokio::time::timeout_at(deadline, tokio::time::sleep(duration))
                .await
                .map_err(|_| timed_out()),
            Behavior::Fail(stderr) => Err(GitError::Command {
                command: format!("fake {url}"),
                stderr: stderr.to_string(),
            }),
            Behavior::Hang => {
                let _ = tokio::time::timeout_at(deadline, std::future::pending::<()>()).await;
                Err(timed_out())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(VcsEvent::Finished(url.to_string()));
        result
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn is_working_copy(&self, path: &Path) -> bool {
        self.working_copies.lock().unwrap().contains_key(path)
    }

    async fn fetch(&self, path: &Path, deadline: Instant) -> std::result::Result<(), GitError> {
        let url = self.working_copies.lock().unwrap().get(path).cloned();
        match url {
            Some(url) => self.perform(&url, deadline).await,
            None => Err(GitError::Command {
                command: "fake fetch".to_string(),
                stderr: "not a working copy".to_string(),
            }),
        }
    }

    async fn clone_repo(&self, url: &str, path: &Path, deadline: Instant) -> std::result::Result<(), GitError> {
        self.perform(url, deadline).await?;
        self.working_copies
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), url.to_string());
        Ok(())
    }
}

/// Observer that remembers which batches started and how many results arrived
#[derive(Default)]
pub struct RecordingObserver {
    pub batches: Mutex<Vec<(usize, usize)>>,
    pub finished: AtomicUsize,
}

impl SyncObserver for RecordingObserver {
    fn batch_started(&self, batch: &Batch, batch_count: usize) {
        self.batches.lock().unwrap().push((batch.index, batch_count));
    }

    fn project_finished(&self, _result: &ProjectResult) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
