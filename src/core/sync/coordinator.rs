//! HUD coordinator: turns scheduler events into a live status line.

use crate::core::scheduler::{Batch, SyncObserver};
use crate::core::stats::{clean_error_message, ProjectResult};
use crate::core::sync::renderer::HudRenderer;
use crate::core::sync::state::{Stage, SyncState};
use crate::core::config::HUD_REFRESH_MILLIS;
use crate::core::SyncStatistics;
use crate::catalog::Project;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct SyncCoordinator {
    state: Arc<Mutex<SyncState>>,
    stats: Arc<SyncStatistics>,
    renderer: HudRenderer,
    hud: ProgressBar,
}

impl SyncCoordinator {
    pub fn new(project_names: &[String], concurrency: usize, stats: Arc<SyncStatistics>) -> Self {
        let state = SyncState::new(project_names, concurrency);
        let hud = ProgressBar::new_spinner();
        hud.set_style(
            ProgressStyle::default_spinner()
                .template("{wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self {
            state: Arc::new(Mutex::new(state)),
            stats,
            renderer: HudRenderer::new(),
            hud,
        }
    }

    /// Starts redrawing the HUD; send `true` on the returned channel to stop
    pub fn start(&self) -> (watch::Sender<bool>, JoinHandle<()>) {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);
        let renderer = self.renderer.clone();
        let hud = self.hud.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(HUD_REFRESH_MILLIS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Ok(state_guard) = state.lock() {
                            hud.set_message(renderer.render(&state_guard, &stats));
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            hud.finish_and_clear();
        });

        (stop_tx, handle)
    }
}

impl SyncObserver for SyncCoordinator {
    fn batch_started(&self, batch: &Batch, batch_count: usize) {
        let names: Vec<String> = batch
            .projects
            .iter()
            .map(Project::path_with_namespace)
            .collect();
        if let Ok(mut guard) = self.state.lock() {
            guard.start_batch(batch.index + 1, batch_count, names.iter().map(String::as_str));
        }
    }

    fn project_started(&self, project: &Project) {
        if let Ok(mut guard) = self.state.lock() {
            guard.set_stage(&project.path_with_namespace(), Stage::Syncing);
        }
    }

    fn project_finished(&self, result: &ProjectResult) {
        let name = result.project.path_with_namespace();
        if !result.outcome.is_success() {
            let reason = match result.outcome.reason() {
                Some(reason) => clean_error_message(reason),
                None => result.outcome.text().to_string(),
            };
            self.hud
                .println(format!("{} {}  {}", result.outcome.symbol(), name, reason));
        }
        if let Ok(mut guard) = self.state.lock() {
            guard.set_outcome(&name, result.outcome.clone());
        }
    }
}
