//! glsync: mirror every project under a GitLab group into a local tree

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use glsync::catalog::CloneProtocol;
use glsync::commands::{handle_mirror_command, DisplayMode};
use glsync::core::{load_file_config, ConfigOverrides, SyncConfig};

/// Exit code of a strict run in which some projects did not sync
const STRICT_FAILURE_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "glsync", version, about = "Mirror every project under a GitLab group")]
struct Cli {
    /// Full path of the root group, e.g. acme/platform
    #[arg(env = "GL_ROOT_PATH")]
    root_group: Option<String>,

    /// Local directory the group tree is mirrored into
    #[arg(long, env = "GL_LOCAL_BASE_PATH")]
    base_dir: Option<PathBuf>,

    /// GitLab server URL
    #[arg(long, env = "GL_URL")]
    url: Option<String>,

    /// Private access token
    #[arg(long, env = "GL_TOKEN", hide = true, hide_env_values = true)]
    token: Option<String>,

    /// Server section of the config file
    #[arg(long, env = "GL_CONFIG_SECTION")]
    section: Option<String>,

    /// Config file (default: <config dir>/glsync/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Projects per batch
    #[arg(short, long, env = "GL_BATCH")]
    batch_size: Option<usize>,

    /// Seconds allowed per clone or fetch
    #[arg(short, long, env = "GL_TIMEOUT")]
    timeout: Option<u64>,

    /// Maximum concurrent git operations (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Sync one project at a time
    #[arg(long, conflicts_with = "jobs")]
    sequential: bool,

    /// Clone address to use
    #[arg(long, value_enum)]
    protocol: Option<CloneProtocol>,

    /// Exit with code 2 when any project failed or timed out
    #[arg(long)]
    strict: bool,

    /// One progress line per project
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Print the final report only
    #[arg(short, long)]
    quiet: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn display_mode(&self) -> DisplayMode {
        if self.quiet {
            DisplayMode::Quiet
        } else if self.verbose {
            DisplayMode::Verbose
        } else {
            DisplayMode::Hud
        }
    }

    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            base_dir: self.base_dir,
            root_group: self.root_group,
            batch_size: self.batch_size,
            timeout_secs: self.timeout,
            jobs: self.jobs,
            sequential: self.sequential,
            protocol: self.protocol,
            url: self.url,
            token: self.token,
            section: self.section,
            strict: self.strict,
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mode = cli.display_mode();
    let file_config = load_file_config(cli.config.as_deref())?;
    let config = SyncConfig::resolve(cli.overrides(), file_config)?;
    tracing::debug!(?config, "resolved configuration");

    let summary = handle_mirror_command(&config, mode).await?;

    if config.strict && summary.has_failures() {
        return Ok(ExitCode::from(STRICT_FAILURE_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}
