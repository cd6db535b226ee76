use crate::helpers::{json_body, TestApp};
use serde_json::json;
use wiremock::{
    matchers::{path, query_param},
    Mock, ResponseTemplate,
};

async fn mount_vehicles(app: &TestApp, route: &str, vehicles: usize) {
    let activity: Vec<_> = (0..vehicles)
        .map(|_| json!({ "MonitoredVehicleJourney": { "ProgressStatus": "normalProgress" } }))
        .collect();

    Mock::given(path("/api/siri/vehicle-monitoring.json"))
        .and(query_param("LineRef", route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Siri": { "ServiceDelivery": { "VehicleMonitoringDelivery": [{
                "VehicleActivity": activity
            }] } }
        })))
        .mount(&app.transit_server)
        .await;
}

#[tokio::test]
async fn subscribed_routes_are_split_into_cancelled_and_active() {
    // given
    let app = TestApp::spawn().await;
    app.subscribe("a@b.com", "B1").await;
    app.subscribe("c@d.com", "B2").await;
    app.subscribe("e@f.com", "B2").await;
    mount_vehicles(&app, "B1", 0).await;
    mount_vehicles(&app, "B2", 3).await;

    // when
    let response = app.get("/cancelled", &[]).await;

    // then
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["cancelled_routes"], json!(["B1"]));
    assert_eq!(body["active_routes"], json!(["B2"]));
    assert_eq!(body["count_cancelled"], 1);
    assert_eq!(body["count_active"], 1);
}

#[tokio::test]
async fn routes_with_an_unavailable_feed_are_skipped() {
    // given
    let app = TestApp::spawn().await;
    app.subscribe("a@b.com", "B1").await;
    app.subscribe("a@b.com", "B9").await;
    mount_vehicles(&app, "B1", 1).await;
    Mock::given(path("/api/siri/vehicle-monitoring.json"))
        .and(query_param("LineRef", "B9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.transit_server)
        .await;

    // when
    let response = app.get("/cancelled", &[]).await;

    // then
    let body = json_body(response).await;
    assert_eq!(body["active_routes"], json!(["B1"]));
    assert_eq!(body["cancelled_routes"], json!([]));
}

#[tokio::test]
async fn cancelled_returns_a_404_without_subscriptions() {
    // given
    let app = TestApp::spawn().await;

    // when
    let response = app.get("/cancelled", &[]).await;

    // then
    assert_eq!(response.status(), 404);
}
