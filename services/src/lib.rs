//! Domain layer for the QR attendance checkpoint.
//!
//! Two independently locked collections live here:
//! - [`TokenRegistry`]: live one-time tokens and their expiry.
//! - [`AttendanceLedger`]: recorded attendance, at most one row per student per day.
//!
//! [`AttendanceService`] composes them into the redemption protocol used by the HTTP layer.
//! Everything is in-process state; running more than one server process gives each process
//! its own registry and ledger, so tokens issued by one cannot be redeemed on another.

pub mod attendance_service;
pub mod clock;
pub mod csv;
pub mod error;
pub mod ledger;
pub mod ledger_store;
pub mod qr;
pub mod token_registry;

pub use attendance_service::{AttendanceService, RedemptionRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AttendanceError, StorageError};
pub use ledger::{AttendanceLedger, AttendanceRecord, Attendee};
pub use ledger_store::{CsvFileStore, LedgerStore, MemoryStore};
pub use token_registry::{IssuedToken, TokenRegistry};
