//! Attendance read routes: issue a QR code, export the ledger, count records.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::SecondsFormat;
use util::config;

use super::common::CountResponse;
use crate::{
    response::{ApiResponse, error_response},
    state::AppState,
};

pub const TOKEN_EXPIRES_HEADER: HeaderName = HeaderName::from_static("x-token-expires-at");

/// GET `/generate_qr`
///
/// Issues a new one-time token and returns a PNG QR code encoding
/// `{base_url}/submit/{token}`.
///
/// `base_url` is `PUBLIC_BASE_URL` when configured, otherwise it is derived from the
/// request's `Host` (and `X-Forwarded-Proto`, if a proxy set one).
///
/// **Response**: `image/png`, with `X-Token-Expires-At` carrying the RFC 3339 expiry.
pub async fn generate_qr(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let base_url = submission_base_url(&headers);

    let (issued, png) = match state.attendance().issue_qr(&base_url) {
        Ok(v) => v,
        Err(e) => return error_response::<()>(e).into_response(),
    };

    let mut out = HeaderMap::new();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    out.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(v) =
        HeaderValue::from_str(&issued.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true))
    {
        out.insert(TOKEN_EXPIRES_HEADER, v);
    }

    (StatusCode::OK, out, png).into_response()
}

fn submission_base_url(headers: &HeaderMap) -> String {
    let configured = config::public_base_url();
    if !configured.trim().is_empty() {
        return configured;
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|v| *v == "http" || *v == "https")
        .unwrap_or("http");

    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) if !host.is_empty() => format!("{scheme}://{host}"),
        _ => format!("{scheme}://{}:{}", config::host(), config::port()),
    }
}

/// GET `/attendance.csv`
///
/// Export every attendance record as a CSV attachment.
///
/// **Response**: `text/csv` attachment with columns:
/// `First Name,Last Name,Student ID,Timestamp`. The header row is always present.
pub async fn export_attendance_csv(
    State(state): State<AppState>,
) -> (StatusCode, (HeaderMap, String)) {
    let csv = state.attendance().ledger().to_csv();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"attendance.csv\""),
    );

    (StatusCode::OK, (headers, csv))
}

/// GET `/attendance-count`
///
/// ```json
/// { "status": "success", "message": "Attendance count retrieved", "data": { "count": 12 } }
/// ```
pub async fn attendance_count(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<CountResponse>>) {
    let count = state.attendance().ledger().count();
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            CountResponse { count },
            "Attendance count retrieved",
        )),
    )
}
