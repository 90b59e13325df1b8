//! Unified error handling for the credit package backend
//!
//! Every handler returns [`AppResult`]. Errors are values that flow back to the
//! terminal error stage in [`crate::middleware::error`], which turns them into the
//! `{status, message}` envelope.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::sync::Arc;

use crate::api::envelope::EnvelopeStatus;

pub const DUPLICATE_DATA_MESSAGE: &str = "duplicate data";
pub const INVALID_ID_MESSAGE: &str = "invalid ID";
pub const MALFORMED_JSON_MESSAGE: &str = "Malformed JSON body, check commas and quotes";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    /// Request body or params failed schema validation
    Validation { message: String },
    /// Body could not be parsed as JSON at all
    MalformedJson { detail: String },
    /// Uniqueness violation (duplicate package name)
    Conflict { message: String },
    /// Identifier is well formed but names nothing, or is not an identifier
    InvalidId { id: String },
    /// No route matched the request
    RouteNotFound { method: String, path: String },
    /// Webhook secret missing or wrong
    Unauthorized { message: String },
    /// Data store unreachable or query failure
    Database { message: String },
    /// Anything unexpected, including caught panics
    Internal { message: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    backtrace: Arc<Backtrace>,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Validation {
            message: message.into(),
        })
    }

    pub fn malformed_json(detail: impl Into<String>) -> Self {
        Self::new(AppErrorKind::MalformedJson {
            detail: detail.into(),
        })
    }

    pub fn duplicate() -> Self {
        Self::new(AppErrorKind::Conflict {
            message: DUPLICATE_DATA_MESSAGE.to_string(),
        })
    }

    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::new(AppErrorKind::InvalidId { id: id.into() })
    }

    pub fn route_not_found(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(AppErrorKind::RouteNotFound {
            method: method.into(),
            path: path.into(),
        })
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Unauthorized {
            message: message.into(),
        })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Internal {
            message: message.into(),
        })
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Validation { .. } => 400,
            AppErrorKind::MalformedJson { .. } => 400,
            AppErrorKind::Conflict { .. } => 409,
            AppErrorKind::InvalidId { .. } => 400,
            AppErrorKind::RouteNotFound { .. } => 404,
            AppErrorKind::Unauthorized { .. } => 401,
            AppErrorKind::Database { .. } => 500,
            AppErrorKind::Internal { .. } => 500,
        }
    }

    /// Envelope `status` field: `fail` for client errors, `error` for server errors.
    ///
    /// A body that is not JSON at all is reported as `error` even though it is a 400.
    pub fn status(&self) -> EnvelopeStatus {
        match &self.kind {
            AppErrorKind::MalformedJson { .. } => EnvelopeStatus::Error,
            _ if self.status_code() >= 500 => EnvelopeStatus::Error,
            _ => EnvelopeStatus::Fail,
        }
    }

    /// Message that is safe to show to any client
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Validation { message } => message.clone(),
            AppErrorKind::MalformedJson { .. } => MALFORMED_JSON_MESSAGE.to_string(),
            AppErrorKind::Conflict { message } => message.clone(),
            AppErrorKind::InvalidId { .. } => INVALID_ID_MESSAGE.to_string(),
            AppErrorKind::RouteNotFound { method, path } => {
                format!("Route not found: {} {}", method, path)
            }
            AppErrorKind::Unauthorized { message } => message.clone(),
            AppErrorKind::Database { .. } | AppErrorKind::Internal { .. } => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Full internal description, only rendered in development mode
    pub fn detail(&self) -> String {
        match &self.kind {
            AppErrorKind::MalformedJson { detail } => detail.clone(),
            AppErrorKind::InvalidId { id } => format!("no credit package with id '{}'", id),
            AppErrorKind::Database { message } => message.clone(),
            AppErrorKind::Internal { message } => message.clone(),
            _ => self.user_message(),
        }
    }

    /// Captured backtrace, present only when `RUST_BACKTRACE` enables capture
    pub fn stack(&self) -> Option<String> {
        match self.backtrace.status() {
            BacktraceStatus::Captured => Some(self.backtrace.to_string()),
            _ => None,
        }
    }

    pub fn is_malformed_json(&self) -> bool {
        matches!(self.kind, AppErrorKind::MalformedJson { .. })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// From<DatabaseError> lives in database/error.rs

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
