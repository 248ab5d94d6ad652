use crate::error::{AppError, Result};

/// Fixed minimum bid increment in budget units.
pub const MIN_BID_INCREMENT: i64 = 1;

/// Fallback countdown for a freshly nominated auction when a draft has no
/// settings row (12 hours, a slow email-league cadence).
pub const DEFAULT_NOMINATION_SECONDS: i64 = 12 * 3600;

/// Fallback minimum time-remaining guarantee after an accepted bid.
pub const DEFAULT_BID_SECONDS: i64 = 12 * 3600;

/// How often the background sweeper looks for expired auctions (seconds).
/// Deadlines are only ever checked lazily, so this bounds how stale an
/// expired-but-open auction can get.
pub const SWEEP_INTERVAL_SECS: u64 = 5;

/// How often the quiet-hours scheduler re-evaluates the window (seconds).
/// Must stay well under a minute so no auction silently expires inside the
/// window before the pause lands.
pub const QUIET_HOURS_TICK_SECS: u64 = 30;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Shared secret for admin endpoints (ADMIN_CODE). Empty means every
    /// admin request is rejected.
    pub admin_code: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "draft.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            admin_code: std::env::var("ADMIN_CODE").unwrap_or_default(),
        })
    }
}
