//! HTTP surface of the QR attendance checkpoint.
//!
//! - `GET  /generate_qr` issues a one-time token and returns it as a PNG QR code
//! - `POST /mark_attendance` redeems a token for an attendance record
//! - `GET  /attendance.csv` downloads the ledger
//! - `GET  /attendance-count`, `POST /clear-attendance` for the operator
//! - `GET  /health`

pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod tasks;
