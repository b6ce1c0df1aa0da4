//! Request middleware

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::app::AppState;

/// Rejection returned when the global API quota is exhausted
#[derive(Debug, thiserror::Error)]
#[error("Too many requests")]
pub struct RateLimited;

impl IntoResponse for RateLimited {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
    }
}

/// Middleware applying the shared API rate limiter
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimited> {
    if state.api_limiter.check().is_err() {
        warn!(path = %request.uri().path(), "API rate limit exceeded");
        return Err(RateLimited);
    }

    Ok(next.run(request).await)
}
