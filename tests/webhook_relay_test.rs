mod common;

use axum::http::{Method, Request, StatusCode};
use axum::body::Body;
use common::{create_test_app, json_request, telegram_update, TestAppBuilder, WELCOME};
use credit_package_backend::cache::JoinedUserStore;
use credit_package_backend::messaging::ChatId;
use serde_json::json;

const UPDATE_ACK: &str = "update received";

#[tokio::test]
async fn test_first_start_gets_welcome() {
    let mut app = create_test_app();

    let (status, body) = app.post_json("/webhook", telegram_update(42, "/start")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": UPDATE_ACK}));
    assert_eq!(app.next_message().await, (ChatId::Id(42), WELCOME.to_string()));
    assert!(app.joined.is_joined(42).await.unwrap());
}

#[tokio::test]
async fn test_repeated_start_is_echoed() {
    let mut app = create_test_app();

    app.post_json("/webhook", telegram_update(42, "/start")).await;
    app.next_message().await;
    app.post_json("/webhook", telegram_update(42, "/start")).await;

    assert_eq!(
        app.next_message().await,
        (ChatId::Id(42), "Chat 42: /start".to_string())
    );
}

#[tokio::test]
async fn test_other_text_is_echoed() {
    let mut app = create_test_app();

    app.post_json("/webhook", telegram_update(-1001, "how many credits left?"))
        .await;

    assert_eq!(
        app.next_message().await,
        (ChatId::Id(-1001), "Chat -1001: how many credits left?".to_string())
    );
    assert!(app.joined.is_empty().await);
}

#[tokio::test]
async fn test_updates_without_text_are_acked_and_ignored() {
    let mut app = create_test_app();

    let (status, body) = app
        .post_json(
            "/webhook",
            json!({"update_id": 7, "edited_channel_post": {"chat": {"id": 1}}}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], UPDATE_ACK);
    app.assert_no_message().await;
}

#[tokio::test]
async fn test_send_failure_does_not_change_ack() {
    let mut app = TestAppBuilder::new().failing_sender().build();

    let (status, body) = app.post_json("/webhook", telegram_update(5, "/start")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": UPDATE_ACK}));
    assert_eq!(app.next_message().await.1, WELCOME);
}

#[tokio::test]
async fn test_malformed_update_is_bad_request() {
    let mut app = create_test_app();

    let (status, body) = app
        .send(json_request(Method::POST, "/webhook", "{\"message\": "))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    app.assert_no_message().await;
}

#[tokio::test]
async fn test_secret_token_is_enforced_when_configured() {
    let mut app = TestAppBuilder::new().webhook_secret("hush").build();

    let (status, body) = app.post_json("/webhook", telegram_update(8, "/start")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
    app.assert_no_message().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("x-telegram-bot-api-secret-token", "hush")
        .body(Body::from(telegram_update(8, "/start").to_string()))
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.next_message().await, (ChatId::Id(8), WELCOME.to_string()));
}

#[tokio::test]
async fn test_send_msg_forwards_verbatim() {
    let mut app = create_test_app();

    let (status, body) = app
        .post_json("/sendMsg", json!({"chat_id": 77, "message": "Class moved to 7pm"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "message": "message queued"}));
    assert_eq!(
        app.next_message().await,
        (ChatId::Id(77), "Class moved to 7pm".to_string())
    );

    app.post_json(
        "/sendMsg",
        json!({"chat_id": "@studio_news", "message": "New packages!"}),
    )
    .await;
    assert_eq!(
        app.next_message().await,
        (ChatId::Username("@studio_news".to_string()), "New packages!".to_string())
    );
}

#[tokio::test]
async fn test_send_msg_rejects_invalid_payloads() {
    let mut app = create_test_app();

    for payload in [
        json!({"chat_id": 77, "message": ""}),
        json!({"chat_id": "studio_news", "message": "hi"}),
        json!({"message": "hi"}),
    ] {
        let (status, body) = app.post_json("/sendMsg", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
        assert_eq!(body["status"], "fail");
    }

    app.assert_no_message().await;
}
