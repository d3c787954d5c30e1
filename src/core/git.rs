//! Git operations for the publish pipeline.
//!
//! Thin wrappers over the git CLI; any non-zero exit is fatal.

use crate::error::Result;
use crate::utils::command;

/// Set the committer identity to the acting CI user.
pub fn configure_identity(actor: &str) -> Result<()> {
    command::run("git", &["config", "user.name", actor], "git config user.name")?;
    let email = format!("{}@users.noreply.github.com", actor);
    command::run(
        "git",
        &["config", "user.email", &email],
        "git config user.email",
    )?;
    Ok(())
}

/// Re-point origin at a token-authenticated URL so the tag push works
/// inside the workflow.
pub fn set_authenticated_remote(token: &str, repo: &str) -> Result<()> {
    let url = format!("https://{}@github.com/{}.git", token, repo);
    command::run(
        "git",
        &["remote", "set-url", "origin", &url],
        "git remote set-url",
    )?;
    Ok(())
}

/// Create an annotated tag at the current commit.
pub fn create_annotated_tag(tag: &str) -> Result<()> {
    command::run("git", &["tag", "-a", tag, "-m", tag], "git tag")?;
    Ok(())
}

pub fn push_tag(tag: &str) -> Result<()> {
    command::run("git", &["push", "origin", tag], "git push")?;
    Ok(())
}
