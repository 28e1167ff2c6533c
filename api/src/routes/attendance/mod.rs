use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod common;
mod get;
mod post;

pub use common::{CountResponse, MarkAttendanceReq};
pub use get::{attendance_count, export_attendance_csv, generate_qr};
pub use post::{clear_attendance, mark_attendance};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/generate_qr", get(generate_qr))
        .route("/mark_attendance", post(mark_attendance))
        .route("/attendance.csv", get(export_attendance_csv))
        .route("/attendance-count", get(attendance_count))
        .route("/clear-attendance", post(clear_attendance))
}
