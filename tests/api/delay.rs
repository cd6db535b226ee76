use crate::helpers::{json_body, TestApp};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

fn vehicle_monitoring(vehicles: &[(&str, i64)]) -> Value {
    let activity: Vec<_> = vehicles
        .iter()
        .map(|(status, delay)| {
            json!({ "MonitoredVehicleJourney": { "ProgressStatus": status, "Delay": delay } })
        })
        .collect();

    json!({ "Siri": { "ServiceDelivery": { "VehicleMonitoringDelivery": [{
        "VehicleActivity": activity
    }] } } })
}

#[tokio::test]
async fn delayed_vehicles_trigger_an_alert() {
    // given
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/siri/vehicle-monitoring.json"))
        .and(query_param("LineRef", "M15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vehicle_monitoring(&[
            ("delayed", 900),
            ("normalProgress", 0),
        ])))
        .expect(1)
        .mount(&app.transit_server)
        .await;

    // when
    let response = app.get("/delay", &[("route", "M15")]).await;

    // then
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["delayed_vehicles"], 1);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Checked vehicle delay for route M15"));
    assert_eq!(app.channel.published_subjects(), vec!["Vehicle Delay Alert"]);
}

#[tokio::test]
async fn minor_delays_do_not_trigger_an_alert() {
    // given
    let app = TestApp::spawn().await;
    Mock::given(path("/api/siri/vehicle-monitoring.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vehicle_monitoring(&[("delayed", 60)])),
        )
        .mount(&app.transit_server)
        .await;

    // when
    let response = app.get("/delay", &[("route", "M15")]).await;

    // then
    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["delayed_vehicles"], 0);
    assert!(app.channel.published_subjects().is_empty());
}

#[tokio::test]
async fn feed_outage_is_still_acknowledged() {
    // given
    let app = TestApp::spawn().await;
    Mock::given(path("/api/siri/vehicle-monitoring.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.transit_server)
        .await;

    // when
    let response = app.get("/delay", &[("route", "M15")]).await;

    // then
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn delay_requires_a_route() {
    // given
    let app = TestApp::spawn().await;

    // when
    let response = app.get("/delay", &[]).await;

    // then
    assert_eq!(response.status(), 400);
}
