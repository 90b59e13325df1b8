use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{MessagingError, MessagingResult};
use super::types::{ApiEnvelope, ChatId, SendMessagePayload, SentMessage};
use super::MessageSender;
use crate::config::TelegramConfig;

/// Header the platform echoes back on every webhook call when a secret was
/// registered with `setWebhook`
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Bot API client. The token is part of the URL path, so it is never logged and
/// reqwest errors are stripped of their URL before being surfaced.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    bot_token: Option<String>,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> MessagingResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MessagingError::Network {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone().filter(|t| !t.trim().is_empty()),
            timeout,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.bot_token.is_some()
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, token, method)
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> MessagingResult<SentMessage> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or(MessagingError::MissingCredential)?;

        let payload = SendMessagePayload { chat_id, text };
        let response = self
            .client
            .post(self.method_url(token, "sendMessage"))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MessagingError::Network {
                message: format!("sendMessage request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!(
                chat_id = %chat_id,
                status = status.as_u16(),
                body = %body,
                "sendMessage rejected"
            );
            return Err(MessagingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ApiEnvelope<SentMessage> =
            serde_json::from_str(&body).map_err(|e| MessagingError::InvalidResponse {
                message: format!("invalid sendMessage JSON response: {}", e),
            })?;

        match envelope {
            ApiEnvelope {
                ok: true,
                result: Some(sent),
                ..
            } => {
                debug!(chat_id = %chat_id, message_id = sent.message_id, "message delivered");
                Ok(sent)
            }
            ApiEnvelope { description, .. } => Err(MessagingError::Api {
                status: status.as_u16(),
                body: description.unwrap_or(body),
            }),
        }
    }
}

/// Constant-time comparison of the configured webhook secret with the header value
pub fn verify_secret_token(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(value) => secure_eq(expected.as_bytes(), value.as_bytes()),
        None => false,
    }
}

pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
