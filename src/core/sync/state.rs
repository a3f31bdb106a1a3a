//! Shared mirror state for HUD rendering.

use crate::git::SyncOutcome;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Discovered, batch not started yet
    Queued,
    /// Batch started, waiting on a worker slot
    Waiting,
    /// Clone or fetch in flight
    Syncing,
    Done,
}

#[derive(Debug, Clone)]
pub struct ProjectState {
    pub stage: Stage,
    pub last_update: Instant,
    pub outcome: Option<SyncOutcome>,
}

impl ProjectState {
    fn new(now: Instant) -> Self {
        Self {
            stage: Stage::Queued,
            last_update: now,
            outcome: None,
        }
    }
}

pub struct SyncState {
    pub projects: HashMap<String, ProjectState>,
    pub total_projects: usize,
    pub start_time: Instant,
    /// One-based number of the running batch, 0 before the first
    pub current_batch: usize,
    pub batch_count: usize,
    pub concurrency: usize,
}

impl SyncState {
    pub fn new(project_names: &[String], concurrency: usize) -> Self {
        let now = Instant::now();
        let projects = project_names
            .iter()
            .map(|name| (name.clone(), ProjectState::new(now)))
            .collect();
        Self {
            projects,
            total_projects: project_names.len(),
            start_time: now,
            current_batch: 0,
            batch_count: 0,
            concurrency,
        }
    }

    pub fn start_batch<'a>(
        &mut self,
        batch_number: usize,
        batch_count: usize,
        members: impl IntoIterator<Item = &'a str>,
    ) {
        self.current_batch = batch_number;
        self.batch_count = batch_count;
        for name in members {
            self.set_stage(name, Stage::Waiting);
        }
    }

    pub fn set_stage(&mut self, project_name: &str, stage: Stage) {
        if let Some(project_state) = self.projects.get_mut(project_name) {
            project_state.stage = stage;
            project_state.last_update = Instant::now();
        }
    }

    pub fn set_outcome(&mut self, project_name: &str, outcome: SyncOutcome) {
        if let Some(project_state) = self.projects.get_mut(project_name) {
            project_state.stage = Stage::Done;
            project_state.last_update = Instant::now();
            project_state.outcome = Some(outcome);
        }
    }

    pub fn count_stage(&self, stage: Stage) -> usize {
        self.projects
            .values()
            .filter(|project| project.stage == stage)
            .count()
    }
}
