use crate::helpers::{json_body, TestApp};
use serde_json::json;
use std::sync::atomic::Ordering;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

async fn mount_arrival(app: &TestApp, minutes_from_now: i64) {
    let arrival = (OffsetDateTime::now_utc() + Duration::minutes(minutes_from_now))
        .format(&Rfc3339)
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/siri/stop-monitoring.json"))
        .and(query_param("LineRef", "M15"))
        .and(query_param("MonitoringRef", "308209"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Siri": { "ServiceDelivery": { "StopMonitoringDelivery": [{
                "MonitoredStopVisit": [{ "MonitoredVehicleJourney": { "MonitoredCall": {
                    "ExpectedArrivalTime": arrival,
                    "Extensions": { "Distances": {
                        "StopsFromCall": 4,
                        "DistanceFromCall": 3218.688
                    } }
                } } }]
            }] } }
        })))
        .mount(&app.transit_server)
        .await;
}

#[tokio::test]
async fn prediction_returns_the_next_arrival() {
    // given
    let app = TestApp::spawn().await;
    mount_arrival(&app, 12).await;

    // when
    let response = app
        .get("/prediction", &[("route", "M15"), ("stop_id", "308209")])
        .await;

    // then
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    let minutes_away = body["minutes_away"].as_i64().unwrap();
    assert!((11..=12).contains(&minutes_away));
    assert_eq!(body["stops_away"], 4);
    assert_eq!(body["miles_away"], 2.0);
    assert!(body["arrival_time"].is_string());
}

#[tokio::test]
async fn prediction_is_logged_to_the_store() {
    // given
    let app = TestApp::spawn().await;
    mount_arrival(&app, 5).await;

    // when
    app.get("/prediction", &[("route", "M15"), ("stop_id", "308209")])
        .await;

    // then
    let predictions = app.store.predictions.lock().unwrap();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions[0].0.as_ref(), "M15");
    assert_eq!(predictions[0].1.as_ref(), "308209");
}

#[tokio::test]
async fn failed_prediction_logging_does_not_fail_the_request() {
    // given
    let app = TestApp::spawn().await;
    mount_arrival(&app, 5).await;
    app.store.fail_writes.store(true, Ordering::SeqCst);

    // when
    let response = app
        .get("/prediction", &[("route", "M15"), ("stop_id", "308209")])
        .await;

    // then
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn prediction_returns_a_404_when_no_bus_is_coming() {
    // given
    let app = TestApp::spawn().await;
    Mock::given(path("/api/siri/stop-monitoring.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Siri": { "ServiceDelivery": { "StopMonitoringDelivery": [] } }
        })))
        .mount(&app.transit_server)
        .await;

    // when
    let response = app
        .get("/prediction", &[("route", "M15"), ("stop_id", "308209")])
        .await;

    // then
    assert_eq!(response.status(), 404);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No prediction data found");
}

#[tokio::test]
async fn prediction_returns_a_500_when_the_feed_fails() {
    // given
    let app = TestApp::spawn().await;
    Mock::given(path("/api/siri/stop-monitoring.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.transit_server)
        .await;

    // when
    let response = app
        .get("/prediction", &[("route", "M15"), ("stop_id", "308209")])
        .await;

    // then
    assert_eq!(response.status(), 500);
}

#[tokio::test]
async fn prediction_returns_a_400_for_invalid_parameters() {
    // given
    let app = TestApp::spawn().await;
    let test_cases = vec![
        (vec![("stop_id", "308209")], "missing route"),
        (vec![("route", "M15")], "missing stop_id"),
        (vec![("route", "M15"), ("stop_id", "30 82")], "stop_id with a space"),
    ];

    for (query, description) in test_cases {
        // when
        let response = app.get("/prediction", &query).await;

        // then
        assert_eq!(response.status(), 400, "No 400 for {description}");
    }
}
