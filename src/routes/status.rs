use crate::{app_state::AppState, domain::RiderEmail, utils::ApiError};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}

/// Lists subscriptions, optionally for one rider, and re-sends the delay
/// notice to every confirmed one.
#[tracing::instrument(name = "Checking subscription status", skip(app_state, query))]
async fn status(
    State(app_state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let email = query
        .email
        .map(RiderEmail::parse)
        .transpose()
        .map_err(ApiError::Validation)?;

    let subscriptions = app_state
        .subscriptions
        .status(email.as_ref(), app_state.alerts.delay_threshold_minutes)
        .await?;

    Ok(Json(json!({ "subscriptions": subscriptions })))
}

#[derive(Deserialize)]
struct StatusQuery {
    email: Option<String>,
}
