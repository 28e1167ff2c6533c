//! One-time attendance tokens with a fixed time-to-live.
//!
//! All access goes through a single mutex. `consume` checks and removes under that lock,
//! so a token can be redeemed at most once no matter how many requests race for it.
//! Expired entries are swept lazily on `issue` and `consume`; a periodic sweep may also
//! call [`TokenRegistry::evict_expired`], but `consume` never trusts the sweep and always
//! re-checks expiry itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};
use rand::{rngs::OsRng, RngCore};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};

/// Random bytes per token; hex encoding doubles this to the printed length.
pub const TOKEN_BYTES: usize = 16;

pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

/// Longest accepted TTL. Larger values fall back to [`DEFAULT_TTL`].
pub const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A freshly issued token and the instant it stops being redeemable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Local>,
}

pub struct TokenRegistry {
    tokens: Mutex<HashMap<String, DateTime<Local>>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TokenRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let ttl = match TimeDelta::from_std(ttl) {
            Ok(delta) if ttl <= MAX_TTL => delta,
            _ => {
                warn!(?ttl, max = ?MAX_TTL, "Token TTL out of range, using default");
                default_ttl()
            }
        };
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Issues a new token valid until `now + ttl`.
    pub fn issue(&self) -> IssuedToken {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .or_else(|| now.checked_add_signed(default_ttl()))
            .unwrap_or(now);

        let mut tokens = self.lock();
        evict_locked(&mut tokens, now);

        let token = loop {
            let candidate = generate_token();
            if !tokens.contains_key(&candidate) {
                break candidate;
            }
        };
        tokens.insert(token.clone(), expires_at);

        debug!(live = tokens.len(), expires_at = %expires_at, "Token issued");
        IssuedToken { token, expires_at }
    }

    /// Redeems `token` if it is live. Returns `false` for unknown, expired and
    /// already-consumed tokens without telling them apart.
    pub fn consume(&self, token: &str) -> bool {
        let now = self.clock.now();

        let mut tokens = self.lock();
        evict_locked(&mut tokens, now);

        match tokens.remove(token) {
            Some(expires_at) if now < expires_at => {
                debug!(live = tokens.len(), "Token consumed");
                true
            }
            _ => false,
        }
    }

    /// Drops every entry whose expiry has passed. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        evict_locked(&mut self.lock(), now)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entries, soonest expiry first. Expired entries that have not been swept yet
    /// are left out.
    pub fn live_tokens(&self) -> Vec<IssuedToken> {
        let now = self.clock.now();
        let mut live: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, expires_at)| now < **expires_at)
            .map(|(token, expires_at)| IssuedToken {
                token: token.clone(),
                expires_at: *expires_at,
            })
            .collect();
        live.sort_by_key(|t| t.expires_at);
        live
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Local>>> {
        self.tokens.lock().expect("token registry lock poisoned")
    }
}

fn default_ttl() -> TimeDelta {
    TimeDelta::seconds(DEFAULT_TTL.as_secs() as i64)
}

fn evict_locked(tokens: &mut HashMap<String, DateTime<Local>>, now: DateTime<Local>) -> usize {
    let before = tokens.len();
    tokens.retain(|_, expires_at| now < *expires_at);
    before - tokens.len()
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
