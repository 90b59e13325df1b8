//! Uniform `{status, message?, data?}` response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Fail,
    Error,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: EnvelopeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: None,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn empty(status: EnvelopeStatus) -> Self {
        Self {
            status,
            message: None,
            data: None,
        }
    }

    pub fn message(status: EnvelopeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// `{status:"success", data}` with 200
pub fn success<T: Serialize>(data: T) -> Response {
    success_with_status(data, StatusCode::OK)
}

/// `{status:"success", data}` with an explicit status code
pub fn success_with_status<T: Serialize>(data: T, status: StatusCode) -> Response {
    (status, Json(Envelope::success(data))).into_response()
}

/// `{status:"success", data}` with 201
pub fn created<T: Serialize>(data: T) -> Response {
    success_with_status(data, StatusCode::CREATED)
}

/// Deletion success: `{status:"success"}` and nothing else
pub fn deleted() -> Response {
    (StatusCode::OK, Json(Envelope::empty(EnvelopeStatus::Success))).into_response()
}

/// `{status:"success", message}` with 200
pub fn acknowledged(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(Envelope::message(EnvelopeStatus::Success, message)),
    )
        .into_response()
}
