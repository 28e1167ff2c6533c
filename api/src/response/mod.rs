use axum::{Json, http::StatusCode};
use serde::Serialize;
use services::AttendanceError;
use tracing::error;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "status": "success",
///   "message": "Attendance marked for Ada Lovelace"
/// }
/// ```
///
/// - `status` is `"success"` or `"error"`.
/// - `message` provides a human-readable context string.
/// - `data` is omitted when the endpoint has nothing to return.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response carrying `data`.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }

    /// Constructs a success response with only a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data: None,
        }
    }

    /// Constructs an error response with a message and no data.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            data: None,
        }
    }
}

/// Converts a domain failure into its HTTP status and error body.
///
/// | error          | status |
/// |----------------|--------|
/// | `Validation`   | 400    |
/// | `InvalidToken` | 400    |
/// | `Duplicate`    | 409    |
/// | `Storage`/`Qr` | 500, generic message, detail logged |
pub fn error_response<T>(err: AttendanceError) -> (StatusCode, Json<ApiResponse<T>>)
where
    T: Serialize,
{
    let status = match &err {
        AttendanceError::Validation(_) | AttendanceError::InvalidToken => StatusCode::BAD_REQUEST,
        AttendanceError::Duplicate { .. } => StatusCode::CONFLICT,
        AttendanceError::Storage(_) | AttendanceError::Qr(_) => {
            error!(error = %err, "Internal failure while handling attendance request");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            );
        }
    };

    (status, Json(ApiResponse::error(err.to_string())))
}
