use crate::{
    app_state::AppState,
    domain::{RiderEmail, RouteId, SubscriptionKey},
    utils::ApiError,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::delete,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new().route("/subscription", delete(remove_subscription))
}

/// Drops a single record. The rider's channel subscription is left alone.
#[tracing::instrument(name = "Removing a subscription", skip(app_state, query))]
async fn remove_subscription(
    State(app_state): State<AppState>,
    query: Result<Query<RemoveQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let key = SubscriptionKey {
        route: RouteId::parse(query.route.unwrap_or_default()).map_err(ApiError::Validation)?,
        email: RiderEmail::parse(query.email.unwrap_or_default()).map_err(ApiError::Validation)?,
    };

    app_state.subscriptions.remove_record(&key).await?;

    Ok(Json(json!({ "message": "Subscription removed successfully." })))
}

#[derive(Deserialize)]
struct RemoveQuery {
    route: Option<String>,
    email: Option<String>,
}
