// Internal modules - not part of public API
pub(crate) mod config;
pub(crate) mod planner;
pub(crate) mod progress;
pub(crate) mod scheduler;
pub(crate) mod stats;
pub(crate) mod task;

// HUD display
pub mod sync;


// Public API - curated exports only
pub mod api;

// Re-export key items at module level for convenience
pub use api::*;
