use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Stamps every incoming request with a fresh UUID v4.
#[derive(Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().hyphenated().to_string();
        HeaderValue::from_str(&id)
            .map(RequestId::new)
            .map_err(|e| tracing::warn!(error.message = %e, "Failed to build a request id"))
            .ok()
    }
}

pub fn from_x_request_id<B>(request: &Request<B>) -> Option<&str> {
    let value = request.headers().get(X_REQUEST_ID)?;
    value
        .to_str()
        .map_err(|e| tracing::warn!(error.message = %e, "Ignoring a non-ASCII x-request-id"))
        .ok()
}
