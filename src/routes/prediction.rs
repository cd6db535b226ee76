use crate::{
    app_state::AppState,
    domain::{RouteId, StopId},
    transit_client::Prediction,
    utils::ApiError,
};
use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new().route("/prediction", get(predict))
}

#[tracing::instrument(name = "Predicting arrival", skip(app_state, query))]
async fn predict(
    State(app_state): State<AppState>,
    query: Result<Query<PredictionQuery>, QueryRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Query(query) = query?;
    let route = RouteId::parse(query.route.unwrap_or_default()).map_err(ApiError::Validation)?;
    let stop_id = StopId::parse(query.stop_id.unwrap_or_default()).map_err(ApiError::Validation)?;

    let prediction = app_state
        .transit_client
        .prediction(&route, &stop_id)
        .await
        .context("Failed to fetch an arrival prediction")?
        .ok_or_else(|| ApiError::NotFound("No prediction data found".into()))?;

    if let Err(e) = app_state
        .store
        .log_prediction(&route, &stop_id, &prediction)
        .await
    {
        tracing::warn!(error.cause_chain = ?e, "Failed to log the prediction");
    }

    Ok(Json(prediction))
}

#[derive(Deserialize)]
struct PredictionQuery {
    route: Option<String>,
    stop_id: Option<String>,
}
