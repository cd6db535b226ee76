use crate::{app_state::AppState, domain::RouteId, utils::ApiError};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/delay", get(check_delay))
}

/// Always acknowledges; a feed outage is logged, not surfaced.
#[tracing::instrument(name = "Checking vehicle delay", skip(app_state, query))]
async fn check_delay(
    State(app_state): State<AppState>,
    query: Result<Query<DelayQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let route = RouteId::parse(query.route.unwrap_or_default()).map_err(ApiError::Validation)?;
    let threshold = app_state.alerts.vehicle_delay_threshold;

    let delayed_vehicles = match app_state.transit_client.vehicle_activity(&route).await {
        Ok(journeys) => journeys.iter().filter(|j| j.is_delayed(threshold)).count(),
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, "Failed to fetch vehicle activity");
            0
        }
    };

    let summary = if delayed_vehicles > 0 {
        app_state
            .subscriptions
            .publish_best_effort(
                &format!(
                    "Bus route {route} has vehicles experiencing delays of more than {threshold} minutes."
                ),
                "Vehicle Delay Alert",
            )
            .await;
        "Delay alert sent."
    } else {
        "No significant delays detected at this time."
    };

    Ok(Json(json!({
        "message": format!("Checked vehicle delay for route {route}. {summary}"),
        "delayed_vehicles": delayed_vehicles,
    })))
}

#[derive(Deserialize)]
struct DelayQuery {
    route: Option<String>,
}
