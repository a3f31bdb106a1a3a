//! Git testing utilities

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Sets up a git repository with user config
pub fn setup_git_repo(path: &Path) -> Result<()> {
    let init_result = Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(path)
        .output()?;

    if !init_result.status.success() {
        anyhow::bail!("Git not available - skipping test");
    }

    for (key, value) in [
        ("user.name", "Test User"),
        ("user.email", "test@example.com"),
        ("commit.gpgsign", "false"),
    ] {
        Command::new("git")
            .args(["config", key, value])
            .current_dir(path)
            .output()?;
    }

    Ok(())
}

/// Creates a test commit in the repository
pub fn create_test_commit(path: &Path, file_name: &str, content: &str, message: &str) -> Result<()> {
    std::fs::write(path.join(file_name), content)?;

    Command::new("git")
        .args(["add", file_name])
        .current_dir(path)
        .output()?;

    let commit_result = Command::new("git")
        .args(["commit", "--quiet", "-m", message])
        .current_dir(path)
        .output()?;

    if !commit_result.status.success() {
        anyhow::bail!(
            "Failed to create commit: {}",
            String::from_utf8_lossy(&commit_result.stderr)
        );
    }

    Ok(())
}

/// Creates `<parent>/<name>.git`, a bare repository with one commit
///
/// Its path doubles as a clone URL, standing in for a hosted project.
pub fn create_bare_remote(parent: &Path, name: &str) -> Result<PathBuf> {
    let work = parent.join(format!("{name}-work"));
    std::fs::create_dir_all(&work)?;
    setup_git_repo(&work)?;
    create_test_commit(&work, "README.md", &format!("# {name}"), "Initial commit")?;

    let bare = parent.join(format!("{name}.git"));
    let result = Command::new("git")
        .arg("clone")
        .arg("--quiet")
        .arg("--bare")
        .arg(&work)
        .arg(&bare)
        .output()?;

    if !result.status.success() {
        anyhow::bail!(
            "Failed to create bare remote: {}",
            String::from_utf8_lossy(&result.stderr)
        );
    }

    Ok(bare)
}

/// Checks if git is available in the system
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
