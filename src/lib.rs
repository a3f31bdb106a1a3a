//! # glsync
//!
//! `glsync` mirrors every project under a GitLab group, including all nested
//! subgroups, into a local directory tree that follows the group hierarchy.
//! Missing projects are cloned, existing working copies are fetched.
//!
//! ## How a run works
//!
//! - **Catalog**: the root group is resolved and all projects beneath it are
//!   listed once, without duplicates. Failures here abort the run.
//! - **Batches**: projects are cut into consecutive batches; a batch starts
//!   only when every project of the previous one has finished.
//! - **Bounded work**: at most `concurrency` git operations run at once, and
//!   each one has its own deadline.
//! - **Isolation**: a failed or timed-out project is reported and the run
//!   carries on.
//!
//! ## Example
//!
//! ```rust,no_run
//! use glsync::core::plan_path;
//! use std::path::Path;
//!
//! let namespace = vec!["acme".to_string(), "platform".to_string(), "api".to_string()];
//! let target = plan_path(Path::new("/srv/mirror"), &namespace).unwrap();
//! assert_eq!(target.path(), Path::new("/srv/mirror/acme/platform/api"));
//! ```

pub mod catalog;
pub mod commands;
pub mod core;
pub mod error;
pub mod git;
pub mod utils;
