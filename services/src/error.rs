use thiserror::Error;
use validator::ValidationErrors;

/// Failures of the optional ledger persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed attendance row at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Every way a redemption or ledger operation can fail.
///
/// `InvalidToken` deliberately covers unknown, expired and already-used tokens alike.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Missing required fields: {0}")]
    Validation(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Attendance already recorded today")]
    Duplicate { student_id: String },

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("QR rendering failed: {0}")]
    Qr(String),
}

impl From<ValidationErrors> for AttendanceError {
    fn from(errors: ValidationErrors) -> Self {
        AttendanceError::Validation(format_validation_errors(&errors))
    }
}

/// Joins the messages of all field errors into one line, sorted by field name so the
/// output is stable.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(_, errs)| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
