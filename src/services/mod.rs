//! Services module for business logic and integrations

pub mod webhook_relay;

pub use webhook_relay::{Reply, WebhookRelay};
