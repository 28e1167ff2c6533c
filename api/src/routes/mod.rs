//! HTTP route entry point.
//!
//! Route groups include:
//! - `/health` → Health check endpoint
//! - attendance endpoints (`/generate_qr`, `/mark_attendance`, `/attendance.csv`,
//!   `/attendance-count`, `/clear-attendance`), mounted at the root so scanned URLs and
//!   existing front-end pages keep working unchanged

use crate::routes::{attendance::attendance_routes, health::health_routes};
use crate::state::AppState;
use axum::Router;

pub mod attendance;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
///
/// The state is applied here, so the returned router is ready to serve. Callers add
/// cross-cutting layers (CORS, request logging).
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .merge(attendance_routes())
        .with_state(app_state)
}
