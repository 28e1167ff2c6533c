use crate::{response::ApiResponse, state::AppState};
use axum::{Json, Router, response::IntoResponse, routing::get};

/// Builds the `/health` route group.
///
/// Useful for uptime checks, load balancers, or deployment health monitoring.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /health
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "status": "success",
///   "message": "Health check passed",
///   "data": "OK"
/// }
/// ```
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK", "Health check passed"))
}
