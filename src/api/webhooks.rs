use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::Response,
};
use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::api::envelope;
use crate::api::validation::ValidatedJson;
use crate::app::AppState;
use crate::error::AppError;
use crate::messaging::telegram::{verify_secret_token, SECRET_TOKEN_HEADER};
use crate::messaging::{ChatId, Update};

pub const UPDATE_RECEIVED_MESSAGE: &str = "update received";
pub const MESSAGE_QUEUED_MESSAGE: &str = "message queued";
pub const MAX_MESSAGE_LENGTH: usize = 4096;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(custom(function = "validate_chat_id"))]
    pub chat_id: ChatId,
    #[validate(length(min = 1, max = 4096, message = "must be between 1 and 4096 characters"))]
    pub message: String,
}

fn validate_chat_id(chat_id: &ChatId) -> Result<(), ValidationError> {
    match chat_id {
        ChatId::Id(_) => Ok(()),
        ChatId::Username(name) if name.starts_with('@') && name.len() > 1 => Ok(()),
        ChatId::Username(_) => {
            let mut err = ValidationError::new("chat_id");
            err.message = Some("must be an integer or an @username".into());
            Err(err)
        }
    }
}

/// Rejects webhook calls that do not carry the configured secret token. A
/// no-op when no secret is configured.
pub struct WebhookAuth;

impl FromRequestParts<AppState> for WebhookAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.webhook_secret.as_deref() else {
            return Ok(WebhookAuth);
        };

        let provided = parts
            .headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        if verify_secret_token(expected, provided) {
            Ok(WebhookAuth)
        } else {
            warn!("Webhook call with missing or invalid secret token");
            Err(AppError::unauthorized("Invalid webhook secret token"))
        }
    }
}

/// POST /webhook
///
/// Acknowledged before the join store is consulted or the reply is sent.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    _auth: WebhookAuth,
    ValidatedJson(update): ValidatedJson<Update>,
) -> Response {
    info!(update_id = ?update.update_id, "Received chat update");
    // Detached; the task logs its own send failures
    drop(state.relay.handle_update(update));
    envelope::acknowledged(UPDATE_RECEIVED_MESSAGE)
}

/// POST /sendMsg
pub async fn send_message(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> Response {
    // Detached; the task logs its own send failures
    drop(state.relay.forward(request.chat_id, request.message));
    envelope::acknowledged(MESSAGE_QUEUED_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_request_validation() {
        let ok: SendMessageRequest =
            serde_json::from_value(json!({"chat_id": "@news", "message": "hi"})).unwrap();
        assert!(ok.validate().is_ok());

        let bad_chat: SendMessageRequest =
            serde_json::from_value(json!({"chat_id": "news", "message": "hi"})).unwrap();
        assert!(bad_chat.validate().is_err());

        let empty: SendMessageRequest =
            serde_json::from_value(json!({"chat_id": 1, "message": ""})).unwrap();
        assert!(empty.validate().is_err());

        let long: SendMessageRequest = serde_json::from_value(
            json!({"chat_id": 1, "message": "a".repeat(MAX_MESSAGE_LENGTH + 1)}),
        )
        .unwrap();
        assert!(long.validate().is_err());
    }
}
