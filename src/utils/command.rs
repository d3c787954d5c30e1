//! Command execution primitives with consistent error handling.

use std::process::{Command, Output, Stdio};

use crate::error::{Error, Result};

/// Run a command and return stdout on success.
///
/// Returns trimmed stdout if the command succeeds.
/// Returns an error with stderr (or stdout fallback) if it fails.
pub fn run(program: &str, args: &[&str], context: &str) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::subprocess(context, format!("failed to start: {}", e)))?;

    if !output.status.success() {
        return Err(Error::subprocess(context, error_text(&output)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command with stdout/stderr inherited from the parent process.
///
/// Used for long-running subprocesses (build toolchain, vendor installers)
/// whose output should stream straight to the CI log rather than be
/// captured. Only the exit status is inspected.
pub fn run_passthrough(program: &str, args: &[&str], context: &str) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Error::subprocess(context, format!("failed to start: {}", e)))?;

    if !status.success() {
        return Err(Error::subprocess(
            context,
            format!("exit code {}", status.code().unwrap_or(1)),
        ));
    }

    Ok(())
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}
