//! Request-level failures.
//!
//! [`AppError`] knows its own status code, machine code, sensitivity and log
//! level ([`ErrorMetadata`]); the API crate only renders it. `Database` wraps
//! `sqlx::Error` when the `sqlx` feature is on.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Validation failures
    Debug,
    /// Rejected credentials and ownership mismatches
    Warn,
    Error,
}

pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Machine-readable code, e.g. `STORAGE_ERROR`
    fn error_code(&self) -> &'static str;

    /// What the client sees; 500-class errors use a fixed generic text.
    fn client_message(&self) -> String;

    /// Sensitive errors never carry `details` in responses.
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Media processing error: {0}")]
    MediaProcessing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Internal failure with a client-safe message and a logged-only cause.
    pub fn internal(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::InternalWithSource {
            message: message.into(),
            source: source.into(),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: "Internal server error".to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// How a variant presents itself over HTTP and in logs.
struct Presentation {
    status: u16,
    code: &'static str,
    kind: &'static str,
    sensitive: bool,
    level: LogLevel,
}

const fn server_side(code: &'static str, kind: &'static str) -> Presentation {
    Presentation {
        status: 500,
        code,
        kind,
        sensitive: true,
        level: LogLevel::Error,
    }
}

impl AppError {
    fn presentation(&self) -> Presentation {
        match self {
            AppError::Database(_) => server_side("DATABASE_ERROR", "Database"),
            AppError::Storage(_) => server_side("STORAGE_ERROR", "Storage"),
            AppError::MediaProcessing(_) => server_side("MEDIA_PROCESSING_ERROR", "MediaProcessing"),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                server_side("INTERNAL_ERROR", "Internal")
            }
            AppError::InvalidInput(_) => Presentation {
                status: 400,
                code: "INVALID_INPUT",
                kind: "InvalidInput",
                sensitive: false,
                level: LogLevel::Debug,
            },
            AppError::BadRequest(_) => Presentation {
                status: 400,
                code: "BAD_REQUEST",
                kind: "BadRequest",
                sensitive: false,
                level: LogLevel::Debug,
            },
            AppError::Unauthorized(_) => Presentation {
                status: 401,
                code: "UNAUTHORIZED",
                kind: "Unauthorized",
                sensitive: false,
                level: LogLevel::Warn,
            },
        }
    }

    /// Variant name, reported alongside details outside production.
    pub fn error_type(&self) -> &'static str {
        self.presentation().kind
    }

    /// Display text followed by up to five `Caused by:` lines from the source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        const MAX_CAUSES: usize = 5;

        let mut details = self.to_string();
        let mut causes = std::iter::successors(self.source(), |&err| err.source());
        for cause in causes.by_ref().take(MAX_CAUSES) {
            details.push_str(&format!("\n  Caused by: {}", cause));
        }
        if causes.next().is_some() {
            details.push_str("\n  ... (truncated)");
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.presentation().status
    }

    fn error_code(&self) -> &'static str {
        self.presentation().code
    }

    fn is_sensitive(&self) -> bool {
        self.presentation().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.presentation().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::BadRequest(msg) | AppError::Unauthorized(msg) => {
                msg.clone()
            }
            AppError::InternalWithSource { message, .. } => message.clone(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::MediaProcessing(_) => "Failed to process media".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}
