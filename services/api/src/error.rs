//! services/api/src/error.rs
//!
//! Defines the startup error type for the service and the mapping from core
//! errors to HTTP responses used by every handler.

use crate::config::ConfigError;
use axum::http::StatusCode;
use preschool_core::assessment::AssessmentError;
use preschool_core::attendance::AttendanceError;
use preschool_core::dates::DateError;
use preschool_core::ports::PortError;
use preschool_core::validation::ValidationErrors;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// What a handler answers on failure: a status and a plain-text message.
pub type HandlerError = (StatusCode, String);
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Maps a port failure to a response. Internal details are logged, not returned.
pub fn port_failure(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        PortError::Conflict(what) => (StatusCode::CONFLICT, what),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(detail) => {
            error!("{}: {}", context, detail);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to {}", context))
        }
    }
}

pub fn invalid(errors: ValidationErrors) -> HandlerError {
    (StatusCode::UNPROCESSABLE_ENTITY, errors.to_string())
}

pub fn bad_date(e: DateError) -> HandlerError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

pub fn attendance_failure(context: &str, e: AttendanceError) -> HandlerError {
    match e {
        AttendanceError::Date(e) => bad_date(e),
        AttendanceError::Port(e) => port_failure(context, e),
    }
}

pub fn assessment_failure(e: AssessmentError) -> HandlerError {
    match e {
        AssessmentError::UnknownInstrument(_) => (StatusCode::NOT_FOUND, e.to_string()),
        AssessmentError::NotInProgress => (StatusCode::CONFLICT, e.to_string()),
        _ => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

pub fn forbidden() -> HandlerError {
    (
        StatusCode::FORBIDDEN,
        "You do not have access to this resource".to_string(),
    )
}
