//! Schema validation for request bodies and path params
//!
//! [`ValidatedJson`] and [`ValidatedPath`] run serde deserialization and then
//! `validator::Validate` before the handler is entered. A failure at either step
//! rejects the request with an [`AppError`], so handlers only ever see valid input.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::AppError;

/// JSON body that has been parsed and validated
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(map_json_rejection)?;

        value
            .validate()
            .map_err(|e| AppError::validation(describe_validation_errors(&e)))?;

        Ok(Self(value))
    }
}

/// Path params that have been parsed and validated
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(describe_validation_errors(&e)))?;

        Ok(Self(value))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonSyntaxError(err) => AppError::malformed_json(err.body_text()),
        JsonRejection::JsonDataError(err) => {
            AppError::validation(format!("Invalid request body: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            AppError::validation("Expected request with `Content-Type: application/json`")
        }
        other => AppError::validation(other.body_text()),
    }
}

/// Flatten validator output into one readable, deterministic line.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => format!("{} {}", field, message),
                None => format!("{} is invalid ({})", field, err.code),
            })
        })
        .collect();
    parts.sort();

    if parts.is_empty() {
        "Invalid request".to_string()
    } else {
        parts.join("; ")
    }
}

/// Identifier params must be UUIDs.
pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| {
            let mut err = ValidationError::new("uuid");
            err.message = Some("must be a valid UUID".into());
            err
        })
}
