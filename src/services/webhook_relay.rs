//! Inbound chat update relay
//!
//! Each update is handled on a spawned task that consults the join store and
//! sends the reply. The webhook ack never waits on either.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cache::JoinedUserStore;
use crate::messaging::types::IncomingMessage;
use crate::messaging::{ChatId, MessageSender, MessagingError, Update};

pub const START_COMMAND: &str = "/start";

/// What the relay decided to send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome { chat_id: i64, text: String },
    Echo { chat_id: i64, text: String },
}

impl Reply {
    pub fn chat_id(&self) -> i64 {
        match self {
            Reply::Welcome { chat_id, .. } | Reply::Echo { chat_id, .. } => *chat_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::Welcome { text, .. } | Reply::Echo { text, .. } => text,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Reply::Welcome { .. } => "welcome",
            Reply::Echo { .. } => "echo",
        }
    }
}

pub fn echo_text(chat_id: i64, text: &str) -> String {
    format!("Chat {}: {}", chat_id, text)
}

#[derive(Clone)]
pub struct WebhookRelay {
    sender: Arc<dyn MessageSender>,
    joined: Arc<dyn JoinedUserStore>,
    welcome_message: String,
}

impl WebhookRelay {
    pub fn new(
        sender: Arc<dyn MessageSender>,
        joined: Arc<dyn JoinedUserStore>,
        welcome_message: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            joined,
            welcome_message: welcome_message.into(),
        }
    }

    /// Pick the reply for an update. `None` for updates with no text message.
    pub async fn decide_reply(&self, update: &Update) -> Option<Reply> {
        let IncomingMessage { chat, text, .. } = update.message.as_ref()?;
        let text = text.as_deref()?;
        let chat_id = chat.id;

        if text.trim() == START_COMMAND {
            match self.joined.mark_joined(chat_id).await {
                Ok(true) => {
                    return Some(Reply::Welcome {
                        chat_id,
                        text: self.welcome_message.clone(),
                    })
                }
                Ok(false) => {}
                Err(e) => {
                    // Store outage degrades to an echo rather than a duplicate welcome
                    warn!(
                        chat_id = chat_id,
                        backend = self.joined.backend_name(),
                        error = %e,
                        "join store unavailable, replying with echo"
                    );
                }
            }
        }

        Some(Reply::Echo {
            chat_id,
            text: echo_text(chat_id, text),
        })
    }

    /// Handle an update pushed to the webhook. The reply is decided and sent on
    /// a spawned task; `None` when the update carries no text message.
    pub fn handle_update(&self, update: Update) -> Option<JoinHandle<()>> {
        let has_text = update
            .message
            .as_ref()
            .is_some_and(|message| message.text.is_some());
        if !has_text {
            info!(update_id = ?update.update_id, "update without text message ignored");
            return None;
        }

        let relay = self.clone();
        Some(tokio::spawn(async move {
            let Some(reply) = relay.decide_reply(&update).await else {
                return;
            };
            info!(
                update_id = ?update.update_id,
                chat_id = reply.chat_id(),
                reply = reply.kind(),
                "dispatching reply"
            );
            let chat_id = ChatId::Id(reply.chat_id());
            let text = match reply {
                Reply::Welcome { text, .. } | Reply::Echo { text, .. } => text,
            };
            send(relay.sender.as_ref(), &chat_id, &text).await;
        }))
    }

    /// Forward a message verbatim to the given chat
    pub fn forward(&self, chat_id: ChatId, message: String) -> JoinHandle<()> {
        info!(chat_id = %chat_id, "forwarding message");
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move { send(sender.as_ref(), &chat_id, &message).await })
    }
}

async fn send(sender: &dyn MessageSender, chat_id: &ChatId, text: &str) {
    if let Err(e) = sender.send_message(chat_id, text).await {
        log_send_failure(chat_id, &e);
    }
}

fn log_send_failure(chat_id: &ChatId, err: &MessagingError) {
    match err {
        MessagingError::MissingCredential => {
            error!(chat_id = %chat_id, "TELEGRAM_TOKEN is not configured, message dropped");
        }
        other => match other.external_body() {
            Some(body) => error!(chat_id = %chat_id, response = %body, "failed to send message"),
            None => error!(chat_id = %chat_id, error = %other, "failed to send message"),
        },
    }
}
