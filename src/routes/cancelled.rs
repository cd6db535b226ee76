use crate::{app_state::AppState, domain::RouteId, utils::ApiError};
use anyhow::Context;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/cancelled", get(cancelled_routes))
}

/// Splits subscribed routes by whether the feed reports any vehicle on them.
#[tracing::instrument(name = "Listing cancelled routes", skip(app_state))]
async fn cancelled_routes(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let routes = app_state
        .store
        .routes()
        .await
        .context("Failed to list subscribed routes")?;

    if routes.is_empty() {
        return Err(ApiError::NotFound("No cancelled routes found.".into()));
    }

    let mut cancelled: Vec<RouteId> = Vec::new();
    let mut active: Vec<RouteId> = Vec::new();
    for route in routes {
        match app_state.transit_client.vehicle_activity(&route).await {
            Ok(journeys) if journeys.is_empty() => cancelled.push(route),
            Ok(_) => active.push(route),
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    route = %route,
                    "Skipping a route. Its vehicle activity is unavailable"
                );
            }
        }
    }

    Ok(Json(json!({
        "count_cancelled": cancelled.len(),
        "count_active": active.len(),
        "cancelled_routes": cancelled,
        "active_routes": active,
        "message": "Cancelled and active routes retrieved successfully.",
    })))
}
