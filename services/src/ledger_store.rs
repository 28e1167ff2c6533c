//! Persistence backends for the attendance ledger.
//!
//! The ledger always keeps its records in memory; a store only mirrors them. Store calls
//! are made while the ledger lock is held, so implementations must not block for long.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::csv;
use crate::error::StorageError;
use crate::ledger::{render_csv, AttendanceRecord, CSV_HEADER, TIMESTAMP_FORMAT};

pub trait LedgerStore: Send + Sync {
    /// Every record currently persisted, oldest first.
    fn load(&self) -> Result<Vec<AttendanceRecord>, StorageError>;

    fn append(&self, record: &AttendanceRecord) -> Result<(), StorageError>;

    /// Drops all persisted records.
    fn clear(&self) -> Result<(), StorageError>;
}

/// No persistence: the ledger lives and dies with the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStore;

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Vec<AttendanceRecord>, StorageError> {
        Ok(Vec::new())
    }

    fn append(&self, _record: &AttendanceRecord) -> Result<(), StorageError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// An append-only CSV file using the export header and column order.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    /// Opens `path`, creating it (and its parent directories) with a header row if it is
    /// missing or empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if needs_header {
            fs::write(&path, render_csv(&[]))?;
            info!(path = %path.display(), "Created attendance file");
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a header-only replacement is staged in before it is renamed over `path`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for CsvFileStore {
    fn load(&self) -> Result<Vec<AttendanceRecord>, StorageError> {
        let text = fs::read_to_string(&self.path)?;
        let rows = csv::parse(&text).map_err(|line| StorageError::Malformed {
            line,
            reason: "unterminated quoted field".into(),
        })?;

        let mut rows = rows.into_iter();
        match rows.next() {
            Some((_, header)) if header == CSV_HEADER => {}
            Some((line, _)) => {
                return Err(StorageError::Malformed {
                    line,
                    reason: "unexpected header".into(),
                })
            }
            None => return Ok(Vec::new()),
        }

        rows.filter(|(_, fields)| !(fields.len() == 1 && fields[0].is_empty()))
            .map(|(line, fields)| parse_record(line, fields))
            .collect()
    }

    fn append(&self, record: &AttendanceRecord) -> Result<(), StorageError> {
        let fields = record.csv_fields();
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(csv::row(fields.iter().map(String::as_str)).as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Replaces the file with a header-only copy. The rename is atomic, so a failure leaves
    /// the existing rows in place.
    fn clear(&self) -> Result<(), StorageError> {
        let staging = self.staging_path();
        let staged = File::create(&staging).and_then(|mut file| {
            file.write_all(render_csv(&[]).as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = staged.and_then(|()| fs::rename(&staging, &self.path)) {
            fs::remove_file(&staging).ok();
            return Err(e.into());
        }
        Ok(())
    }
}

fn parse_record(line: usize, fields: Vec<String>) -> Result<AttendanceRecord, StorageError> {
    let [first_name, last_name, student_id, timestamp]: [String; 4] =
        fields.try_into().map_err(|f: Vec<String>| StorageError::Malformed {
            line,
            reason: format!("expected 4 columns, found {}", f.len()),
        })?;

    let timestamp = NaiveDateTime::parse_from_str(&timestamp, TIMESTAMP_FORMAT).map_err(|e| {
        StorageError::Malformed {
            line,
            reason: format!("bad timestamp {timestamp:?}: {e}"),
        }
    })?;

    Ok(AttendanceRecord {
        first_name,
        last_name,
        student_id,
        timestamp,
        token: None,
    })
}
