//! CLI response formatting and output.
//!
//! Provides the JSON envelope, printing, and exit code mapping.

use ortci::{Error, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) {
    use std::io::{self, Write};

    let payload = match serde_json::to_string_pretty(response) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Failed to serialize response: {}", e);
            return;
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Ignore BrokenPipe so piping into head exits cleanly
    let _ = writeln!(handle, "{}", payload);
}

/// Print a command result as the JSON envelope and map it to an exit
/// code: 0 on success, 1 on any failure (no structured codes beyond
/// success/failure).
pub fn print_result<T: Serialize>(result: Result<T>) -> u8 {
    match result {
        Ok(data) => {
            print_response(&CliResponse::success(data));
            0
        }
        Err(err) => {
            print_response(&CliResponse::<()>::from_error(&err));
            1
        }
    }
}
