#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use credit_package_backend::app::{build_router, AppState};
use credit_package_backend::cache::InMemoryJoinedUsers;
use credit_package_backend::config::Environment;
use credit_package_backend::database::credit_package_repository::{
    CreditPackage, NewCreditPackage,
};
use credit_package_backend::database::error::{DatabaseError, DatabaseErrorKind};
use credit_package_backend::database::repository::CreditPackageStore;
use credit_package_backend::health::HealthChecker;
use credit_package_backend::messaging::{
    ChatId, MessageSender, MessagingError, MessagingResult, SentMessage,
};
use credit_package_backend::services::WebhookRelay;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const WELCOME: &str = "Welcome aboard!";

/// Vec-backed store with the same uniqueness rule as the Postgres table
#[derive(Default)]
pub struct MemoryCreditPackages {
    rows: Mutex<Vec<CreditPackage>>,
    unavailable: AtomicBool,
    panic_on_list: AtomicBool,
}

impl MemoryCreditPackages {
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn panic_on_list(&self) {
        self.panic_on_list.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::new(DatabaseErrorKind::ConnectionError {
                message: "pool timed out while waiting for an open connection".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl CreditPackageStore for MemoryCreditPackages {
    async fn find_all(&self) -> Result<Vec<CreditPackage>, DatabaseError> {
        if self.panic_on_list.load(Ordering::SeqCst) {
            panic!("store exploded");
        }
        self.check_available()?;
        Ok(self.rows.lock().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditPackage>, DatabaseError> {
        self.check_available()?;
        Ok(self.rows.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CreditPackage>, DatabaseError> {
        self.check_available()?;
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn insert(&self, package: &NewCreditPackage) -> Result<CreditPackage, DatabaseError> {
        self.check_available()?;
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|p| p.name == package.name) {
            return Err(DatabaseError::new(DatabaseErrorKind::UniqueViolation {
                constraint: Some("credit_packages_name_key".to_string()),
            }));
        }

        let created = CreditPackage {
            id: Uuid::new_v4(),
            name: package.name.clone(),
            credit_amount: package.credit_amount,
            price: package.price,
            created_at: chrono::Utc::now(),
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        self.check_available()?;
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() < before)
    }
}

/// Records every outbound message on a channel; optionally fails after recording
pub struct RecordingSender {
    tx: mpsc::UnboundedSender<(ChatId, String)>,
    fail: bool,
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> MessagingResult<SentMessage> {
        let _ = self.tx.send((chat_id.clone(), text.to_string()));
        if self.fail {
            return Err(MessagingError::Api {
                status: 400,
                body: r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#
                    .to_string(),
            });
        }
        Ok(SentMessage { message_id: 1 })
    }
}

pub struct TestApp {
    pub router: Router,
    pub packages: Arc<MemoryCreditPackages>,
    pub joined: Arc<InMemoryJoinedUsers>,
    pub outbox: mpsc::UnboundedReceiver<(ChatId, String)>,
}

pub struct TestAppBuilder {
    environment: Environment,
    webhook_secret: Option<String>,
    failing_sender: bool,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            environment: Environment::Production,
            webhook_secret: None,
            failing_sender: false,
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn webhook_secret(mut self, secret: &str) -> Self {
        self.webhook_secret = Some(secret.to_string());
        self
    }

    pub fn failing_sender(mut self) -> Self {
        self.failing_sender = true;
        self
    }

    pub fn build(self) -> TestApp {
        let packages = Arc::new(MemoryCreditPackages::default());
        let joined = Arc::new(InMemoryJoinedUsers::new());
        let (tx, outbox) = mpsc::unbounded_channel();
        let sender = Arc::new(RecordingSender {
            tx,
            fail: self.failing_sender,
        });

        let relay = WebhookRelay::new(sender, joined.clone(), WELCOME);
        let state = AppState::new(
            packages.clone(),
            relay,
            HealthChecker::new(None, joined.clone()),
            self.webhook_secret,
        );
        let router = build_router(state, self.environment, &["*".to_string()]);

        TestApp {
            router,
            packages,
            joined,
            outbox,
        }
    }
}

pub fn create_test_app() -> TestApp {
    TestAppBuilder::new().build()
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(empty_request(Method::GET, uri)).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, &body.to_string()))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(empty_request(Method::DELETE, uri)).await
    }

    /// Next outbound message, waiting for the spawned send task
    pub async fn next_message(&mut self) -> (ChatId, String) {
        tokio::time::timeout(Duration::from_secs(2), self.outbox.recv())
            .await
            .expect("timed out waiting for outbound message")
            .expect("sender dropped")
    }

    pub async fn assert_no_message(&mut self) {
        let received = tokio::time::timeout(Duration::from_millis(200), self.outbox.recv()).await;
        assert!(received.is_err(), "unexpected outbound message: {:?}", received);
    }
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn telegram_update(chat_id: i64, text: &str) -> Value {
    serde_json::json!({
        "update_id": 1000,
        "message": {
            "message_id": 1,
            "date": 1700000000,
            "chat": {"id": chat_id, "type": "private"},
            "from": {"id": chat_id, "is_bot": false, "first_name": "Test"},
            "text": text
        }
    })
}
