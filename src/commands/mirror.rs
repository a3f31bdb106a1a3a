//! Mirror command implementation
//!
//! Resolves the root group, lists every project beneath it and hands the
//! catalog to the batch scheduler. Catalog failures abort the run before any
//! local work; per-project failures end up in the returned [`RunSummary`].

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;

use crate::catalog::{GitLabClient, GroupApi, ProjectCatalog};
use crate::core::sync::SyncCoordinator;
use crate::core::{
    set_terminal_title, set_terminal_title_and_flush, BatchScheduler, RunSummary,
    SchedulerOptions, SyncConfig, SyncObserver, VerboseReporter, NO_PROJECTS_MESSAGE,
    RESOLVING_MESSAGE,
};
use crate::git::{GitCli, VersionControl};

const SEPARATOR_WIDTH: usize = 60;

/// How live progress is shown while the scheduler runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// One-line status HUD, failures printed above it
    #[default]
    Hud,
    /// One progress line per project plus a live footer
    Verbose,
    /// Final report only
    Quiet,
}

/// Handles the mirror command against the configured GitLab server
pub async fn handle_mirror_command(config: &SyncConfig, mode: DisplayMode) -> Result<RunSummary> {
    set_terminal_title("🔄 glsync");

    let client = GitLabClient::new(&config.gitlab.url, &config.gitlab.token, config.protocol)
        .context("Failed to set up the GitLab client")?;
    let outcome = mirror_group(ProjectCatalog::new(client), Arc::new(GitCli), config, mode).await;

    set_terminal_title_and_flush("✅ glsync");
    outcome
}

/// Mirrors every project below `config.root_group` into `config.base_dir`
pub async fn mirror_group<A: GroupApi>(
    catalog: ProjectCatalog<A>,
    vcs: Arc<dyn VersionControl>,
    config: &SyncConfig,
    mode: DisplayMode,
) -> Result<RunSummary> {
    let show_progress = mode != DisplayMode::Quiet;
    if show_progress {
        print!("{RESOLVING_MESSAGE}");
        let _ = std::io::stdout().flush();
    }

    let root = catalog
        .resolve(&config.root_group)
        .await
        .with_context(|| format!("Failed to resolve root group '{}'", config.root_group))?;
    let projects = catalog
        .list_all_projects(&root)
        .await
        .with_context(|| format!("Failed to list projects under '{}'", root.full_path))?;

    if projects.is_empty() {
        if show_progress {
            println!("\r{NO_PROJECTS_MESSAGE}");
        }
        return Ok(RunSummary::empty());
    }

    let total = projects.len();
    let project_word = if total == 1 { "project" } else { "projects" };
    if show_progress {
        print!(
            "\r🔄 Mirroring {total} {project_word} from {} into {} ({} concurrent)\n",
            root.full_path,
            config.base_dir.display(),
            config.concurrency
        );
        println!();
    }
    tracing::info!(
        group = %root.full_path,
        projects = total,
        batch_size = config.batch_size,
        concurrency = config.concurrency,
        "starting mirror"
    );

    let scheduler = BatchScheduler::new(vcs, SchedulerOptions::from(config));
    let statistics = scheduler.statistics();

    let summary = match mode {
        DisplayMode::Hud => {
            let names: Vec<String> = projects.iter().map(|p| p.path_with_namespace()).collect();
            let coordinator = Arc::new(SyncCoordinator::new(&names, config.concurrency, statistics));
            let (stop_tx, hud_handle) = coordinator.start();

            let observer: Arc<dyn SyncObserver> = coordinator;
            let summary = scheduler.with_observer(observer).run(projects).await;

            let _ = stop_tx.send(true);
            let _ = hud_handle.await;
            summary
        }
        DisplayMode::Verbose => {
            let reporter = Arc::new(VerboseReporter::new(statistics)?);
            let observer: Arc<dyn SyncObserver> = reporter.clone();
            let summary = scheduler.with_observer(observer).run(projects).await;
            reporter.finish();
            summary
        }
        DisplayMode::Quiet => scheduler.run(projects).await,
    };

    print_report(&summary);
    Ok(summary)
}

fn print_report(summary: &RunSummary) {
    let separator = "━".repeat(SEPARATOR_WIDTH);
    println!();
    println!("{separator}");
    println!("{}", summary.generate_summary());
    let detailed = summary.generate_detailed_summary();
    if !detailed.is_empty() {
        println!();
        println!("{detailed}");
    }
    println!("{separator}");
}
