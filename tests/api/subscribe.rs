use crate::helpers::{json_body, TestApp};
use serde_json::json;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn subscribe_returns_a_200_for_a_valid_request() {
    // given
    let app = TestApp::spawn().await;
    let body = json!({ "route": "42", "stop_id": "100", "email": "a@b.com" });

    // when
    let response = app.post_subscribe(&body).await;

    // then
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let body = json_body(response).await;
    assert_eq!(
        body["message"],
        "Subscription request sent. Please confirm your email."
    );
}

#[tokio::test]
async fn subscribe_persists_a_pending_record() {
    // given
    let app = TestApp::spawn().await;

    // when
    app.subscribe("a@b.com", "42").await;

    // then
    let records = app.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].email.as_ref(), "a@b.com");
    assert_eq!(records[0].route.as_ref(), "42");
    assert_eq!(records[0].stop_id.as_ref(), "100");
    assert_eq!(records[0].status.as_ref(), "pending");
    assert_eq!(records[0].subscription_reference.as_ref(), "PendingConfirmation");
}

#[tokio::test]
async fn subscribe_records_confirmed_when_the_channel_confirms_at_once() {
    // given
    let app = TestApp::spawn().await;
    app.channel.confirm_immediately.store(true, Ordering::SeqCst);

    // when
    app.subscribe("a@b.com", "42").await;

    // then
    let records = app.records();
    assert_eq!(records[0].status.as_ref(), "confirmed");
    assert_eq!(app.channel.published_subjects(), vec!["Subscription Confirmed"]);
}

#[tokio::test]
async fn subscribe_returns_a_400_for_invalid_fields() {
    // given
    let app = TestApp::spawn().await;
    let test_cases = vec![
        (json!({ "stop_id": "100", "email": "a@b.com" }), "missing route"),
        (json!({ "route": "", "stop_id": "100", "email": "a@b.com" }), "empty route"),
        (json!({ "route": "<b>42</b>", "stop_id": "100", "email": "a@b.com" }), "markup in route"),
        (json!({ "route": 42, "stop_id": "100", "email": "a@b.com" }), "numeric route"),
        (json!({ "route": "42", "email": "a@b.com" }), "missing stop_id"),
        (json!({ "route": "42", "stop_id": -1, "email": "a@b.com" }), "negative stop_id"),
        (json!({ "route": "42", "stop_id": "100" }), "missing email"),
        (json!({ "route": "42", "stop_id": "100", "email": "not-an-email" }), "invalid email"),
        (json!({ "route": "42", "stop_id": "100", "email": "a@b" }), "email without a dotted domain"),
    ];

    for (body, description) in test_cases {
        // when
        let response = app.post_subscribe(&body).await;

        // then
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 BAD_REQUEST when the payload had {description}"
        );
        let body = json_body(response).await;
        assert!(body["error"].is_string(), "No error message for {description}");
    }
    assert!(app.records().is_empty());
}

#[tokio::test]
async fn subscribe_returns_a_400_for_malformed_json() {
    // given
    let app = TestApp::spawn().await;

    // when
    let response = app.post_subscribe_raw("{ not json").await;

    // then
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn sixth_subscription_returns_a_403() {
    // given
    let app = TestApp::spawn().await;
    for route in 1..=app.max_subscriptions {
        app.subscribe("a@b.com", &route.to_string()).await;
    }

    // when
    let response = app
        .post_subscribe(&json!({ "route": "99", "stop_id": 100, "email": "a@b.com" }))
        .await;

    // then
    assert_eq!(response.status(), 403);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Subscription limit reached.");
    assert_eq!(app.records().len(), app.max_subscriptions);
}

#[tokio::test]
async fn limit_is_counted_per_rider() {
    // given
    let app = TestApp::spawn().await;
    for route in 1..=app.max_subscriptions {
        app.subscribe("a@b.com", &route.to_string()).await;
    }

    // when
    let response = app
        .post_subscribe(&json!({ "route": "1", "stop_id": 100, "email": "c@d.com" }))
        .await;

    // then
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn subscribe_returns_a_500_and_writes_nothing_if_the_channel_fails() {
    // given
    let app = TestApp::spawn().await;
    app.channel.fail_subscribe.store(true, Ordering::SeqCst);

    // when
    let response = app
        .post_subscribe(&json!({ "route": "42", "stop_id": 100, "email": "a@b.com" }))
        .await;

    // then
    assert_eq!(response.status(), 500);
    assert!(app.records().is_empty());
}

#[tokio::test]
async fn subscribe_returns_a_500_if_the_store_fails() {
    // given
    let app = TestApp::spawn().await;
    app.store.fail_writes.store(true, Ordering::SeqCst);

    // when
    let response = app
        .post_subscribe(&json!({ "route": "42", "stop_id": 100, "email": "a@b.com" }))
        .await;

    // then
    assert_eq!(response.status(), 500);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}
