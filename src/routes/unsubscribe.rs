use crate::{app_state::AppState, domain::RiderEmail, utils::ApiError};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::delete,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/unsubscribe", delete(unsubscribe))
}

#[tracing::instrument(name = "Unsubscribing a rider", skip(app_state, body))]
async fn unsubscribe(
    State(app_state): State<AppState>,
    body: Result<Json<UnsubscribeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let email =
        RiderEmail::parse(request.email.unwrap_or_default()).map_err(ApiError::Validation)?;

    app_state.subscriptions.unsubscribe(&email).await?;

    Ok(Json(json!({
        "message": format!("{email} has been successfully unsubscribed from alerts.")
    })))
}

#[derive(Deserialize)]
struct UnsubscribeRequest {
    email: Option<String>,
}
