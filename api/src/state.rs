//! Application state container shared across Axum route handlers.

use std::sync::Arc;
use std::time::Duration;

use services::{
    AttendanceLedger, AttendanceService, CsvFileStore, StorageError, SystemClock, TokenRegistry,
};
use tracing::info;
use util::config;

/// Central application state shared across the server.
///
/// Holds the attendance service (token registry + ledger) behind an `Arc` so every
/// handler and background task sees the same in-process collections.
#[derive(Clone)]
pub struct AppState {
    attendance: Arc<AttendanceService>,
}

impl AppState {
    pub fn new(attendance: AttendanceService) -> Self {
        Self {
            attendance: Arc::new(attendance),
        }
    }

    /// Builds the state from the global `AppConfig`.
    ///
    /// When `ATTENDANCE_FILE` is set, the ledger is backed by that CSV file and any rows
    /// already in it are loaded.
    pub fn from_config() -> Result<Self, StorageError> {
        let ttl = Duration::from_secs(config::token_ttl_seconds());
        let clock = Arc::new(SystemClock);
        let tokens = TokenRegistry::with_clock(ttl, clock.clone());

        let ledger = match config::attendance_file() {
            Some(path) => {
                info!(path = %path, "Persisting attendance to CSV file");
                AttendanceLedger::with_store(Box::new(CsvFileStore::open(path)?), clock)?
            }
            None => AttendanceLedger::with_clock(clock),
        };

        Ok(Self::new(AttendanceService::new(tokens, ledger)))
    }

    /// Returns a shared reference to the attendance service.
    pub fn attendance(&self) -> &AttendanceService {
        &self.attendance
    }

    /// Returns a cloned handle to the attendance service, for spawned tasks.
    pub fn attendance_clone(&self) -> Arc<AttendanceService> {
        Arc::clone(&self.attendance)
    }
}
