//! HUD renderer for mirror runs.

use crate::core::sync::state::{Stage, SyncState};
use crate::core::SyncStatistics;
use crate::git::OutcomeKind;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
pub struct HudRenderer;

impl HudRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, state: &SyncState, stats: &SyncStatistics) -> String {
        let now = Instant::now();
        let total = state.total_projects.max(1);
        let done = state.count_stage(Stage::Done);
        let active = state.count_stage(Stage::Syncing);
        let percent = (done.saturating_mul(100)) / total;
        let eta = estimate_eta(state, done, total, now);
        let problems = stats.get(OutcomeKind::Failed) + stats.get(OutcomeKind::TimedOut);

        let mut line = format!(
            "🔄 Mirroring {} projects • batch {}/{} • {}/{} active • {}% • ETA {}",
            state.total_projects,
            state.current_batch,
            state.batch_count,
            active,
            state.concurrency,
            percent,
            eta
        );
        if problems > 0 {
            line.push_str(&format!(" • 🔴 {problems}"));
        }
        line
    }
}

fn estimate_eta(state: &SyncState, done: usize, total: usize, now: Instant) -> String {
    if done == 0 {
        return "--".to_string();
    }
    let elapsed = now.duration_since(state.start_time);
    let avg = elapsed.as_secs_f64() / done as f64;
    let remaining = (total.saturating_sub(done)) as f64 * avg;
    format_duration(Duration::from_secs_f64(remaining))
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let mins = secs / 60;
    let rem = secs % 60;
    if mins > 0 {
        format!("{mins}m {rem}s")
    } else {
        format!("{rem}s")
    }
}
