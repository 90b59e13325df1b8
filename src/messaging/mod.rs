//! Outbound chat messaging
//!
//! [`MessageSender`] is the seam between the webhook relay and the chat
//! platform. Production uses [`TelegramClient`]; tests substitute a recorder.

pub mod error;
pub mod telegram;
pub mod types;

use async_trait::async_trait;

pub use error::{MessagingError, MessagingResult};
pub use telegram::TelegramClient;
pub use types::{ChatId, SentMessage, Update};

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> MessagingResult<SentMessage>;
}
