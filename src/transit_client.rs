use crate::{
    configuration::TransitSettings,
    domain::{RouteId, StopId},
};
use anyhow::Context;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const METERS_PER_MILE: f64 = 1609.344;

/// Client for a SIRI bus-time feed.
#[derive(Clone)]
pub struct TransitClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl TransitClient {
    pub fn new(settings: &TransitSettings) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(settings.timeout()).build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    #[tracing::instrument(name = "Fetching vehicle activity", skip(self), fields(route = %route))]
    pub async fn vehicle_activity(
        &self,
        route: &RouteId,
    ) -> Result<Vec<MonitoredVehicleJourney>, anyhow::Error> {
        let url = format!("{}/api/siri/vehicle-monitoring.json", self.base_url);

        let response: SiriResponse = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.expose_secret().as_str()),
                ("LineRef", route.as_ref()),
            ])
            .send()
            .await
            .context("Failed to reach the vehicle monitoring feed")?
            .error_for_status()
            .context("Vehicle monitoring feed returned an error status")?
            .json()
            .await
            .context("Failed to parse the vehicle monitoring feed")?;

        Ok(response
            .siri
            .service_delivery
            .vehicle_monitoring_delivery
            .into_iter()
            .next()
            .map(|delivery| delivery.vehicle_activity)
            .unwrap_or_default()
            .into_iter()
            .map(|activity| activity.monitored_vehicle_journey)
            .collect())
    }

    #[tracing::instrument(
        name = "Fetching arrival prediction",
        skip(self),
        fields(route = %route, stop_id = %stop_id)
    )]
    pub async fn prediction(
        &self,
        route: &RouteId,
        stop_id: &StopId,
    ) -> Result<Option<Prediction>, anyhow::Error> {
        let url = format!("{}/api/siri/stop-monitoring.json", self.base_url);

        let response: SiriResponse = self
            .http_client
            .get(&url)
            .query(&[
                ("key", self.api_key.expose_secret().as_str()),
                ("MonitoringRef", stop_id.as_ref()),
                ("LineRef", route.as_ref()),
            ])
            .send()
            .await
            .context("Failed to reach the stop monitoring feed")?
            .error_for_status()
            .context("Stop monitoring feed returned an error status")?
            .json()
            .await
            .context("Failed to parse the stop monitoring feed")?;

        let now = OffsetDateTime::now_utc();
        let prediction = response
            .siri
            .service_delivery
            .stop_monitoring_delivery
            .into_iter()
            .next()
            .map(|delivery| delivery.monitored_stop_visit)
            .unwrap_or_default()
            .iter()
            .find_map(|visit| Prediction::from_journey(&visit.monitored_vehicle_journey, now));

        if prediction.is_none() {
            tracing::info!("No upcoming arrival found");
        }

        Ok(prediction)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(with = "time::serde::rfc3339")]
    pub arrival_time: OffsetDateTime,
    pub minutes_away: i64,
    pub stops_away: Option<i32>,
    pub miles_away: Option<f64>,
}

impl Prediction {
    fn from_journey(journey: &MonitoredVehicleJourney, now: OffsetDateTime) -> Option<Self> {
        let call = journey.monitored_call.as_ref()?;
        let arrival_time = match call.expected_arrival_time.as_deref() {
            Some(raw) => match OffsetDateTime::parse(raw, &Rfc3339) {
                Ok(arrival_time) => arrival_time,
                Err(e) => {
                    tracing::warn!(error.message = %e, "Ignoring an unparseable arrival time");
                    return None;
                }
            },
            None => return None,
        };

        let distances = call
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.distances.as_ref());

        Some(Self {
            arrival_time,
            minutes_away: (arrival_time - now).whole_minutes().max(0),
            stops_away: distances.and_then(|d| d.stops_from_call),
            miles_away: distances
                .and_then(|d| d.distance_from_call)
                .map(|meters| (meters / METERS_PER_MILE * 100.0).round() / 100.0),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SiriResponse {
    siri: Siri,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Siri {
    service_delivery: ServiceDelivery,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceDelivery {
    #[serde(default)]
    vehicle_monitoring_delivery: Vec<VehicleMonitoringDelivery>,
    #[serde(default)]
    stop_monitoring_delivery: Vec<StopMonitoringDelivery>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VehicleMonitoringDelivery {
    #[serde(default)]
    vehicle_activity: Vec<VehicleActivity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VehicleActivity {
    monitored_vehicle_journey: MonitoredVehicleJourney,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StopMonitoringDelivery {
    #[serde(default)]
    monitored_stop_visit: Vec<MonitoredStopVisit>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MonitoredStopVisit {
    monitored_vehicle_journey: MonitoredVehicleJourney,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredVehicleJourney {
    #[serde(default)]
    progress_status: Option<ProgressStatus>,
    /// Seconds behind schedule.
    #[serde(default)]
    delay: Option<i64>,
    #[serde(default)]
    monitored_call: Option<MonitoredCall>,
}

impl MonitoredVehicleJourney {
    /// Reported as delayed and at least `threshold_minutes` behind.
    pub fn is_delayed(&self, threshold_minutes: u32) -> bool {
        let reported_delayed = self
            .progress_status
            .as_ref()
            .map(ProgressStatus::mentions_delay)
            .unwrap_or(false);

        reported_delayed && self.delay.unwrap_or(0) / 60 >= i64::from(threshold_minutes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProgressStatus {
    One(String),
    Many(Vec<String>),
}

impl ProgressStatus {
    fn mentions_delay(&self) -> bool {
        let delayed = |status: &String| status.to_lowercase().contains("delayed");
        match self {
            ProgressStatus::One(status) => delayed(status),
            ProgressStatus::Many(statuses) => statuses.iter().any(delayed),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MonitoredCall {
    #[serde(default)]
    expected_arrival_time: Option<String>,
    #[serde(default)]
    extensions: Option<CallExtensions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallExtensions {
    #[serde(default)]
    distances: Option<Distances>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Distances {
    #[serde(default)]
    stops_from_call: Option<i32>,
    /// Meters.
    #[serde(default)]
    distance_from_call: Option<f64>,
}
