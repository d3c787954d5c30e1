use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{context} failed: {message}")]
    Subprocess { context: String, message: String },

    #[error("{context}: HTTP {status}")]
    HttpStatus { context: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Dependency deployment failed: {0}")]
    Deps(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn subprocess(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Subprocess {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn http_status(context: impl Into<String>, status: u16) -> Self {
        Error::HttpStatus {
            context: context.into(),
            status,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::Subprocess { .. } => "SUBPROCESS_ERROR",
            Error::HttpStatus { .. } | Error::Http(_) => "HTTP_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Zip(_) => "ARCHIVE_ERROR",
            Error::Deps(_) => "DEPS_ERROR",
            Error::Other(_) => "ERROR",
        }
    }
}
