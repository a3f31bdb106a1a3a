//! Configuration constants and settings
//!
//! A run is driven by one [`SyncConfig`], built once at startup from three
//! layers: command-line flags and environment variables (both collected by
//! clap into [`ConfigOverrides`]), an optional TOML file ([`FileConfig`]),
//! and the defaults below.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::CloneProtocol;
use crate::error::{Result, SyncError};

// Run defaults
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 180; // 3 minutes per clone or fetch

// Config file location: <config_dir>/glsync/config.toml
pub const CONFIG_DIR_NAME: &str = "glsync";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Progress bar configuration
pub const DEFAULT_PROGRESS_BAR_LENGTH: u64 = 100;
pub const PROGRESS_CHARS: &str = "##-";
pub const PROGRESS_TEMPLATE: &str = "{prefix:.bold} {wide_msg}";
pub const HUD_REFRESH_MILLIS: u64 = 250;

// UI Constants
pub const NO_PROJECTS_MESSAGE: &str = "No projects found under the root group.";
pub const RESOLVING_MESSAGE: &str = "🔍 Resolving group...";

// Display formatting constants
pub const PATH_DISPLAY_WIDTH: usize = 30;
pub const NAME_DISPLAY_WIDTH: usize = 30;
pub const ERROR_MESSAGE_MAX_LENGTH: usize = 60;
pub const ERROR_MESSAGE_TRUNCATE_LENGTH: usize = 57;

/// Determines the concurrency limit based on CLI args, config file and system resources
///
/// Priority order:
/// 1. --sequential flag → 1
/// 2. --jobs N flag → N
/// 3. `concurrency` in the config file → N
/// 4. Default → number of CPUs
pub fn get_concurrency(jobs: Option<usize>, sequential: bool, from_file: Option<usize>) -> usize {
    if sequential {
        return 1;
    }

    if let Some(n) = jobs.or(from_file) {
        return n.max(1); // Ensure at least 1
    }

    num_cpus::get().max(1)
}

/// GitLab server credentials
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub url: String,
    pub private_token: String,
}

impl fmt::Debug for ServerSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSection")
            .field("url", &self.url)
            .field("private_token", &"<redacted>")
            .finish()
    }
}

/// Contents of the optional TOML configuration file
///
/// ```toml
/// base_dir = "/srv/mirror"
/// root_group = "acme/platform"
/// batch_size = 10
/// timeout_secs = 180
/// protocol = "ssh"
/// default_section = "work"
///
/// [servers.work]
/// url = "https://gitlab.example.com"
/// private_token = "glpat-..."
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_dir: Option<PathBuf>,
    pub root_group: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub protocol: Option<CloneProtocol>,
    pub default_section: Option<String>,
    #[serde(default)]
    pub servers: BTreeMap<String, ServerSection>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::config(format!("invalid config file: {e}")))
    }

    fn server(&self, section: Option<&str>) -> Result<Option<&ServerSection>> {
        match section.or(self.default_section.as_deref()) {
            Some(name) => self
                .servers
                .get(name)
                .map(Some)
                .ok_or_else(|| SyncError::config(format!("no [servers.{name}] section in config file"))),
            None => Ok(None),
        }
    }
}

/// Default config file location, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads the config file
///
/// An explicitly given path must exist; the default location is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(None),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            FileConfig::parse(&content).map(Some)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(None),
        Err(e) => Err(SyncError::config(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}

/// Values supplied on the command line or through the environment
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub base_dir: Option<PathBuf>,
    pub root_group: Option<String>,
    pub batch_size: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub sequential: bool,
    pub protocol: Option<CloneProtocol>,
    pub url: Option<String>,
    pub token: Option<String>,
    pub section: Option<String>,
    pub strict: bool,
}

/// Connection settings for the hosting service
#[derive(Clone, PartialEq, Eq)]
pub struct GitLabSettings {
    pub url: String,
    pub token: String,
}

impl fmt::Debug for GitLabSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabSettings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fully resolved settings for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Absolute local base directory of the mirror
    pub base_dir: PathBuf,
    /// Full path of the root group, e.g. `acme/platform`
    pub root_group: String,
    pub batch_size: usize,
    /// Per-task deadline length
    pub timeout: Duration,
    pub concurrency: usize,
    pub protocol: CloneProtocol,
    pub gitlab: GitLabSettings,
    /// Exit non-zero when any project failed
    pub strict: bool,
}

impl SyncConfig {
    /// Merges overrides over the file config over defaults, then validates
    pub fn resolve(overrides: ConfigOverrides, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let server = file.server(overrides.section.as_deref())?;

        let url = overrides
            .url
            .or_else(|| server.map(|s| s.url.clone()))
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| SyncError::config("GitLab URL not set (use --url or GL_URL)"))?;
        let token = overrides
            .token
            .or_else(|| server.map(|s| s.private_token.clone()))
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SyncError::config("GitLab token not set (use GL_TOKEN)"))?;

        let root_group = overrides
            .root_group
            .or(file.root_group)
            .map(|group| group.trim().trim_matches('/').to_string())
            .filter(|group| !group.is_empty())
            .ok_or_else(|| SyncError::config("root group not set (pass it as argument or GL_ROOT_PATH)"))?;

        let batch_size = overrides
            .batch_size
            .or(file.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(SyncError::config("batch size must be at least 1"));
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(SyncError::config("timeout must be at least 1 second"));
        }

        let base_dir = match overrides.base_dir.or(file.base_dir) {
            Some(dir) => dir,
            None => std::env::current_dir()
                .map_err(|e| SyncError::config(format!("cannot determine current directory: {e}")))?,
        };

        Ok(Self {
            base_dir: make_absolute(base_dir)?,
            root_group,
            batch_size,
            timeout: Duration::from_secs(timeout_secs),
            concurrency: get_concurrency(overrides.jobs, overrides.sequential, file.concurrency),
            protocol: overrides.protocol.or(file.protocol).unwrap_or_default(),
            gitlab: GitLabSettings { url, token },
            strict: overrides.strict,
        })
    }
}

fn make_absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| SyncError::config(format!("cannot determine current directory: {e}")))?;
    Ok(cwd.join(path))
}
