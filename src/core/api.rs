//! Public API for the core module.
//!
//! This module provides the stable public API for core functionality including:
//! - Run configuration layering
//! - Local path planning
//! - Per-project sync tasks and the batch scheduler
//! - Statistics tracking and run summaries
//!
//! Internal implementation details are not exposed through this API.

// Configuration
pub use super::config::{
    default_config_path, get_concurrency, load_file_config, ConfigOverrides, FileConfig,
    GitLabSettings, ServerSection, SyncConfig,
};
pub use super::config::{DEFAULT_BATCH_SIZE, DEFAULT_TIMEOUT_SECS};

// User-facing messages
pub use super::config::{NO_PROJECTS_MESSAGE, RESOLVING_MESSAGE};

// Planning and per-project work
pub use super::planner::{ensure_directory, plan_path, LocalTarget};
pub use super::task::{process_project, sync_project};

// Scheduling
pub use super::scheduler::{partition, Batch, BatchScheduler, SchedulerOptions, SyncObserver};

// Reporting
pub use super::progress::VerboseReporter;
pub use super::stats::{ProjectResult, RunSummary, SyncStatistics};

// Terminal utilities (re-exported from utils)
pub use crate::utils::{set_terminal_title, set_terminal_title_and_flush};
