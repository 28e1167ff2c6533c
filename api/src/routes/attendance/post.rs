use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::debug;

use super::common::MarkAttendanceReq;
use crate::{
    response::{ApiResponse, error_response},
    state::AppState,
};

/// POST `/mark_attendance`
///
/// Redeem a one-time token for today's attendance record.
///
/// ### Request Body
/// ```json
/// { "first_name": "Ada", "last_name": "Lovelace", "student_id": "u100", "token": "..." }
/// ```
///
/// ### Responses
/// - `200 OK` → `{ "status": "success", "message": "Attendance marked for Ada Lovelace" }`
/// - `400 Bad Request` → a field is missing or blank (token untouched), or the body is not JSON
/// - `400 Bad Request` → `Invalid or expired token`
/// - `409 Conflict` → `Attendance already recorded today` (the token is still consumed)
/// - `500 Internal Server Error` → the attendance file could not be written
pub async fn mark_attendance(
    State(state): State<AppState>,
    body: Result<Json<MarkAttendanceReq>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable attendance payload");
            MarkAttendanceReq::default()
        }
    };

    match state.attendance().redeem(req.into()) {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::ok(format!(
                "Attendance marked for {} {}",
                record.first_name, record.last_name
            ))),
        ),
        Err(e) => error_response(e),
    }
}

/// POST `/clear-attendance`
///
/// Empties the ledger (and the attendance file, when one is configured). Intended as an
/// operator action between sessions.
pub async fn clear_attendance(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    match state.attendance().ledger().clear() {
        Ok(removed) => (
            StatusCode::OK,
            Json(ApiResponse::ok(format!(
                "Attendance cleared ({removed} records removed)"
            ))),
        ),
        Err(e) => error_response(e.into()),
    }
}
