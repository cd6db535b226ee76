use crate::{
    app_state::AppState,
    domain::{EmailChange, RiderEmail},
    utils::ApiError,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::put,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/email", put(update_email))
        .route("/update", put(update_email))
}

#[tracing::instrument(name = "Updating rider email", skip(app_state, body))]
async fn update_email(
    State(app_state): State<AppState>,
    body: Result<Json<EmailChangeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let change = EmailChange::try_from(request).map_err(ApiError::Validation)?;

    let updated = app_state.subscriptions.update_email(change).await?;

    Ok(Json(json!({
        "message": "Email updated successfully.",
        "updated_subscriptions": updated,
    })))
}

#[derive(Deserialize)]
struct EmailChangeRequest {
    old_email: Option<String>,
    new_email: Option<String>,
}

impl TryFrom<EmailChangeRequest> for EmailChange {
    type Error = String;

    fn try_from(request: EmailChangeRequest) -> Result<Self, Self::Error> {
        let old_email = RiderEmail::parse(request.old_email.unwrap_or_default())
            .map_err(|e| format!("old_email: {e}"))?;
        let new_email = RiderEmail::parse(request.new_email.unwrap_or_default())
            .map_err(|e| format!("new_email: {e}"))?;

        EmailChange::new(old_email, new_email)
    }
}
