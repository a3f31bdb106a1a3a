//! Live HUD for mirror runs: state, rendering and the event coordinator.

pub mod coordinator;
pub mod renderer;
pub mod state;

pub use coordinator::SyncCoordinator;
pub use state::{Stage, SyncState};
