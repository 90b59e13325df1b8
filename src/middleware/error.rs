//! Terminal error stage
//!
//! Handlers and extractors return [`AppError`]. Its `IntoResponse` renders the
//! production envelope and stashes the error in the response extensions;
//! [`error_envelope_middleware`] picks it up, logs it and, in development mode,
//! re-renders it with the internal detail and stack.

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;

use crate::api::envelope::EnvelopeStatus;
use crate::config::Environment;
use crate::error::AppError;
use crate::middleware::logging::request_id_of;

/// Error envelope. `error` and `stack` are only filled in development mode.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: EnvelopeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub status_code: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            status: error.status(),
            message: error.user_message(),
            error: None,
            stack: None,
        }
    }

    pub fn verbose(error: &AppError) -> Self {
        Self {
            error: Some(ErrorDetail {
                status_code: error.status_code(),
                detail: error.detail(),
                request_id: error.request_id.clone(),
            }),
            stack: error.stack(),
            ..Self::from_app_error(error)
        }
    }
}

fn status_code_of(error: &AppError) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::from_app_error(&self);
        let mut response = (status_code_of(&self), Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Picks up errors left in the response extensions, logs them and applies the
/// environment's verbosity.
pub async fn error_envelope_middleware(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id_of(&request);

    let mut response = next.run(request).await;

    let Some(mut error) = response.extensions_mut().remove::<AppError>() else {
        return response;
    };
    if error.request_id.is_none() {
        if let Some(id) = request_id {
            error = error.with_request_id(id);
        }
    }

    log_error(&error, &method, &path);

    // Unparseable bodies get the fixed message in every environment
    if error.is_malformed_json() || !environment.is_development() {
        return render(&error, ErrorResponse::from_app_error(&error));
    }

    render(&error, ErrorResponse::verbose(&error))
}

fn render(error: &AppError, body: ErrorResponse) -> Response {
    (status_code_of(error), Json(body)).into_response()
}

fn log_error(error: &AppError, method: &Method, path: &str) {
    let status = error.status_code();
    if status >= 500 {
        tracing::error!(
            status,
            %method,
            path,
            request_id = ?error.request_id,
            message = %error.user_message(),
            detail = %error.detail(),
            "Server error occurred"
        );
    } else {
        tracing::warn!(
            status,
            %method,
            path,
            request_id = ?error.request_id,
            message = %error.user_message(),
            "Client error occurred"
        );
    }
}

/// Fallback for requests that match no route
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::route_not_found(method.as_str(), uri.path())
}

/// `CatchPanicLayer` hook: panics become an internal error envelope
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("handler panicked: {}", detail)).into_response()
}
