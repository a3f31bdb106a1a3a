//! Command implementations driven by the binary

pub mod mirror;

pub use mirror::{handle_mirror_command, mirror_group, DisplayMode};
