//! The attendance ledger: every recorded presence event, in insertion order.
//!
//! A student may hold at most one record per calendar day. The duplicate check and the
//! insert happen under the same lock, so concurrent redemptions for one student cannot
//! both pass the check.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::csv;
use crate::error::{AttendanceError, StorageError};
use crate::ledger_store::{LedgerStore, MemoryStore};

pub const CSV_HEADER: [&str; 4] = ["First Name", "Last Name", "Student ID", "Timestamp"];
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identity fields supplied with a redemption. Expected to be trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    pub first_name: String,
    pub last_name: String,
    pub student_id: String,
    /// Local wall-clock time, whole seconds.
    pub timestamp: NaiveDateTime,
    /// The token that was redeemed, kept for audit. Not persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AttendanceRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn csv_fields(&self) -> [String; 4] {
        [
            self.first_name.clone(),
            self.last_name.clone(),
            self.student_id.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}

pub struct AttendanceLedger {
    records: Mutex<Vec<AttendanceRecord>>,
    store: Box<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl Default for AttendanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceLedger {
    /// An in-memory ledger on the system clock.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            store: Box::new(MemoryStore),
            clock: Arc::new(SystemClock),
        }
    }

    /// Builds a ledger over `store`, seeded with whatever the store already holds.
    pub fn with_store(
        store: Box<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        let records = store.load()?;
        if !records.is_empty() {
            info!(count = records.len(), "Loaded existing attendance records");
        }

        Ok(Self {
            records: Mutex::new(records),
            store,
            clock,
        })
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            store: Box::new(MemoryStore),
            clock,
        }
    }

    /// True if `student_id` already has a record dated today.
    pub fn has_today(&self, student_id: &str) -> bool {
        let today = self.clock.now().date_naive();
        has_on(&self.lock(), student_id, today)
    }

    /// Records `attendee` now, unless they already attended today.
    pub fn append(
        &self,
        attendee: Attendee,
        token: Option<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let now = self.clock.now();
        let timestamp = now
            .naive_local()
            .with_nanosecond(0)
            .unwrap_or_else(|| now.naive_local());

        let mut records = self.lock();
        if has_on(&records, &attendee.student_id, timestamp.date()) {
            return Err(AttendanceError::Duplicate {
                student_id: attendee.student_id,
            });
        }

        let record = AttendanceRecord {
            first_name: attendee.first_name,
            last_name: attendee.last_name,
            student_id: attendee.student_id,
            timestamp,
            token,
        };

        self.store.append(&record)?;
        records.push(record.clone());

        info!(
            student_id = %record.student_id,
            count = records.len(),
            "Attendance recorded"
        );
        Ok(record)
    }

    /// Snapshot of all records in insertion order.
    pub fn export(&self) -> Vec<AttendanceRecord> {
        self.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Empties the ledger and its store. If the store cannot be cleared nothing changes.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let mut records = self.lock();
        self.store.clear().inspect_err(|e| {
            warn!(error = %e, "Failed to clear attendance store");
        })?;

        let removed = records.len();
        records.clear();
        info!(removed, "Attendance ledger cleared");
        Ok(removed)
    }

    /// The export rendered as CSV with a header row.
    pub fn to_csv(&self) -> String {
        render_csv(&self.export())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AttendanceRecord>> {
        self.records.lock().expect("attendance ledger lock poisoned")
    }
}

pub fn render_csv(records: &[AttendanceRecord]) -> String {
    let mut out = csv::row(CSV_HEADER);
    for record in records {
        let fields = record.csv_fields();
        out.push_str(&csv::row(fields.iter().map(String::as_str)));
    }
    out
}

fn has_on(records: &[AttendanceRecord], student_id: &str, day: NaiveDate) -> bool {
    records
        .iter()
        .any(|r| r.student_id == student_id && r.date() == day)
}
