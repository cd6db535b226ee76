use crate::{
    app_state::AppState,
    domain::{NewSubscription, SubscribeRequest},
    utils::ApiError,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribe))
}

#[tracing::instrument(name = "Adding a new subscription", skip(app_state, body))]
async fn subscribe(
    State(app_state): State<AppState>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let new_subscription = NewSubscription::try_from(request).map_err(ApiError::Validation)?;

    let subscription = app_state.subscriptions.subscribe(new_subscription).await?;

    Ok(Json(json!({
        "message": "Subscription request sent. Please confirm your email.",
        "status": subscription.status,
        "subscription": subscription,
    })))
}
