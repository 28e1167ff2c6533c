//! The redemption protocol: validate identity fields, burn the token, then record.
//!
//! The token is consumed before the duplicate check. A student who already attended
//! today therefore still uses up the token they scanned.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::clock::{Clock, SystemClock};
use crate::error::AttendanceError;
use crate::ledger::{AttendanceLedger, AttendanceRecord, Attendee};
use crate::qr;
use crate::token_registry::{IssuedToken, TokenRegistry};

#[derive(Debug, Clone, Default, Validate)]
pub struct RedemptionRequest {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "student_id is required"))]
    pub student_id: String,

    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
}

impl RedemptionRequest {
    /// Builds a request from possibly-absent raw fields, trimming surrounding whitespace.
    pub fn from_raw(
        first_name: Option<&str>,
        last_name: Option<&str>,
        student_id: Option<&str>,
        token: Option<&str>,
    ) -> Self {
        let clean = |v: Option<&str>| v.unwrap_or_default().trim().to_string();
        Self {
            first_name: clean(first_name),
            last_name: clean(last_name),
            student_id: clean(student_id),
            token: clean(token),
        }
    }
}

pub struct AttendanceService {
    tokens: TokenRegistry,
    ledger: AttendanceLedger,
}

impl Default for AttendanceService {
    fn default() -> Self {
        Self::new(TokenRegistry::default(), AttendanceLedger::new())
    }
}

impl AttendanceService {
    pub fn new(tokens: TokenRegistry, ledger: AttendanceLedger) -> Self {
        Self { tokens, ledger }
    }

    /// Both collections on the same clock, ledger kept in memory.
    pub fn with_clock(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            TokenRegistry::with_clock(ttl, clock.clone()),
            AttendanceLedger::with_clock(clock),
        )
    }

    pub fn system(ttl: std::time::Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn ledger(&self) -> &AttendanceLedger {
        &self.ledger
    }

    pub fn issue_token(&self) -> IssuedToken {
        self.tokens.issue()
    }

    /// Issues a token and renders the QR code pointing at its submission page.
    pub fn issue_qr(&self, base_url: &str) -> Result<(IssuedToken, Vec<u8>), AttendanceError> {
        let issued = self.tokens.issue();
        let png = qr::render_png(&qr::submission_url(base_url, &issued.token))?;
        Ok((issued, png))
    }

    /// Exchanges a live token plus identity fields for an attendance record.
    ///
    /// Fields are validated before the token is touched, so a rejected form leaves the
    /// token redeemable.
    pub fn redeem(&self, request: RedemptionRequest) -> Result<AttendanceRecord, AttendanceError> {
        request.validate()?;

        if !self.tokens.consume(&request.token) {
            info!(student_id = %request.student_id, "Rejected invalid or expired token");
            return Err(AttendanceError::InvalidToken);
        }

        let attendee = Attendee {
            first_name: request.first_name,
            last_name: request.last_name,
            student_id: request.student_id,
        };

        self.ledger
            .append(attendee, Some(request.token))
            .inspect_err(|e| {
                if let AttendanceError::Duplicate { student_id } = e {
                    info!(%student_id, "Rejected duplicate attendance");
                }
            })
    }
}
