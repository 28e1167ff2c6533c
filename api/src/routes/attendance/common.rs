use serde::{Deserialize, Serialize};
use services::RedemptionRequest;

/// Body of `POST /mark_attendance`. Every field is optional at the wire level so a
/// missing field is reported as a validation error rather than a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct MarkAttendanceReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub student_id: Option<String>,
    pub token: Option<String>,
}

impl From<MarkAttendanceReq> for RedemptionRequest {
    fn from(req: MarkAttendanceReq) -> Self {
        RedemptionRequest::from_raw(
            req.first_name.as_deref(),
            req.last_name.as_deref(),
            req.student_id.as_deref(),
            req.token.as_deref(),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}
