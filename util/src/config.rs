//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables (and `.env`, if present).
//! Per-field setters allow tests to override values at runtime.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock, RwLockReadGuard};

use tracing::warn;

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub host: String,
    pub port: u16,
    /// Base of the URL encoded into QR codes. Empty means "derive from the request".
    pub public_base_url: String,
    pub token_ttl_seconds: u64,
    /// Period of the background token sweep. `0` disables it.
    pub token_sweep_seconds: u64,
    /// Optional CSV file mirroring the attendance ledger. Empty means in-memory only.
    pub attendance_file: String,
    /// Values that failed to parse during the last load. Kept so they can be logged once a
    /// subscriber exists; the config is usually read before logging is initialized.
    pub load_warnings: Vec<String>,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".into(),
            project_name: "qr-attendance".into(),
            log_level: "api=info,services=info".into(),
            log_file: "api.log".into(),
            log_to_stdout: false,
            host: "127.0.0.1".into(),
            port: 5000,
            public_base_url: String::new(),
            token_ttl_seconds: 120,
            token_sweep_seconds: 30,
            attendance_file: String::new(),
            load_warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing values take their defaults. Values that fail to parse are replaced with the
    /// default and recorded in `load_warnings` rather than aborting startup.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = AppConfig::default();
        let mut warnings = Vec::new();

        Self {
            env: string_or("APP_ENV", defaults.env),
            project_name: string_or("PROJECT_NAME", defaults.project_name),
            log_level: string_or("LOG_LEVEL", defaults.log_level),
            log_file: string_or("LOG_FILE", defaults.log_file),
            log_to_stdout: parse_or("LOG_TO_STDOUT", defaults.log_to_stdout, &mut warnings),
            host: string_or("HOST", defaults.host),
            port: parse_or("PORT", defaults.port, &mut warnings),
            public_base_url: string_or("PUBLIC_BASE_URL", defaults.public_base_url),
            token_ttl_seconds: parse_or(
                "TOKEN_TTL_SECONDS",
                defaults.token_ttl_seconds,
                &mut warnings,
            ),
            token_sweep_seconds: parse_or(
                "TOKEN_SWEEP_SECONDS",
                defaults.token_sweep_seconds,
                &mut warnings,
            ),
            attendance_file: string_or("ATTENDANCE_FILE", defaults.attendance_file),
            load_warnings: warnings,
        }
    }

    /// Emits every recorded parse failure at `warn`. Call after the subscriber is installed.
    pub fn log_load_warnings() {
        for message in &AppConfig::global().load_warnings {
            warn!("{message}");
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock
                .write()
                .expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_public_base_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.public_base_url = value.into());
    }

    pub fn set_token_ttl_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.token_ttl_seconds = value);
    }

    pub fn set_token_sweep_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.token_sweep_seconds = value);
    }

    pub fn set_attendance_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.attendance_file = value.into());
    }
}

fn string_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parse_or<T>(key: &str, default: T, warnings: &mut Vec<String>) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warnings.push(format!("Invalid {key} value {raw:?}: {e}; using default {default}"));
            default
        }),
        Err(_) => default,
    }
}

// --- Free accessors ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn public_base_url() -> String {
    AppConfig::global().public_base_url.clone()
}

pub fn token_ttl_seconds() -> u64 {
    AppConfig::global().token_ttl_seconds
}

pub fn token_sweep_seconds() -> u64 {
    AppConfig::global().token_sweep_seconds
}

pub fn attendance_file() -> Option<String> {
    let path = AppConfig::global().attendance_file.clone();
    (!path.trim().is_empty()).then_some(path)
}
