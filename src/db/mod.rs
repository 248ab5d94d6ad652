//! Storage layer: SQLite via sqlx. All cross-caller coordination happens
//! through conditional updates here and in the operation modules; no
//! in-process locks, since callers may live in separate processes sharing
//! the database file.

pub mod models;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::{DEFAULT_BID_SECONDS, DEFAULT_NOMINATION_SECONDS};
use crate::error::Result;
use models::{AuctionRow, PlayerRow, SettingsRow, TeamRow};

pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().connect_with(opts).await?;
    Ok(pool)
}

/// Per-draft timer and quiet-hours policy. Re-read at the start of every
/// operation, never cached in the process.
#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub nomination_seconds: i64,
    pub bid_seconds: i64,
    pub quiet_hours_enabled: bool,
    pub quiet_start_minute: i64,
    pub quiet_end_minute: i64,
    pub quiet_utc_offset_minutes: i64,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            nomination_seconds: DEFAULT_NOMINATION_SECONDS,
            bid_seconds: DEFAULT_BID_SECONDS,
            quiet_hours_enabled: false,
            quiet_start_minute: 0,
            quiet_end_minute: 0,
            quiet_utc_offset_minutes: 0,
        }
    }
}

/// Settings for a draft, falling back to defaults when no row exists.
pub async fn get_settings(pool: &SqlitePool, draft_id: &str) -> Result<DraftSettings> {
    let row: Option<SettingsRow> =
        sqlx::query_as("SELECT * FROM draft_settings WHERE draft_id = ?")
            .bind(draft_id)
            .fetch_optional(pool)
            .await?;
    Ok(row
        .map(|r| DraftSettings {
            nomination_seconds: r.nomination_seconds,
            bid_seconds: r.bid_seconds,
            quiet_hours_enabled: r.quiet_hours_enabled,
            quiet_start_minute: r.quiet_start_minute,
            quiet_end_minute: r.quiet_end_minute,
            quiet_utc_offset_minutes: r.quiet_utc_offset_minutes,
        })
        .unwrap_or_default())
}

pub async fn get_auction(pool: &SqlitePool, auction_id: &str) -> Result<Option<AuctionRow>> {
    let row = sqlx::query_as("SELECT * FROM auctions WHERE id = ?")
        .bind(auction_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_team(pool: &SqlitePool, team_id: &str) -> Result<Option<TeamRow>> {
    let row = sqlx::query_as("SELECT * FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Resolve a team by its secret join code. This is the only credential the
/// bid path accepts; richer authentication is a collaborator's concern.
pub async fn get_team_by_code(
    pool: &SqlitePool,
    draft_id: &str,
    join_code: &str,
) -> Result<Option<TeamRow>> {
    let row = sqlx::query_as("SELECT * FROM teams WHERE draft_id = ? AND join_code = ?")
        .bind(draft_id)
        .bind(join_code)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get_player(pool: &SqlitePool, player_id: &str) -> Result<Option<PlayerRow>> {
    let row = sqlx::query_as("SELECT * FROM players WHERE id = ?")
        .bind(player_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}
