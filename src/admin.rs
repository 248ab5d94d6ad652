//! Administrative operations: settings, roster/player import, and the
//! full draft reset. All of these are gated behind the admin code at the
//! API layer; parsing of whatever sheet format the rows came from is the
//! caller's problem, this module sees validated-shape JSON rows only.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::MINUTES_PER_DAY;
use crate::error::{AppError, Result};
use crate::events;
use crate::types::{EventType, PrimaryPosition, SecondaryPosition};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsUpdate {
    pub nomination_seconds: i64,
    pub bid_seconds: i64,
    #[serde(default)]
    pub quiet_hours_enabled: bool,
    #[serde(default)]
    pub quiet_start_minute: i64,
    #[serde(default)]
    pub quiet_end_minute: i64,
    #[serde(default)]
    pub quiet_utc_offset_minutes: i64,
}

pub async fn save_settings(
    pool: &SqlitePool,
    draft_id: &str,
    update: &SettingsUpdate,
    now: i64,
) -> Result<()> {
    if update.nomination_seconds < 1 {
        return Err(AppError::Validation("Invalid nomination_seconds".to_string()));
    }
    if update.bid_seconds < 0 {
        return Err(AppError::Validation("Invalid bid_seconds".to_string()));
    }
    for (field, minute) in [
        ("quiet_start_minute", update.quiet_start_minute),
        ("quiet_end_minute", update.quiet_end_minute),
    ] {
        if !(0..MINUTES_PER_DAY).contains(&minute) {
            return Err(AppError::Validation(format!("Invalid {field}")));
        }
    }
    if update.quiet_utc_offset_minutes.abs() > 14 * 60 {
        return Err(AppError::Validation("Invalid quiet_utc_offset_minutes".to_string()));
    }

    sqlx::query(
        "INSERT INTO draft_settings (draft_id, nomination_seconds, bid_seconds, \
         quiet_hours_enabled, quiet_start_minute, quiet_end_minute, \
         quiet_utc_offset_minutes, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (draft_id) DO UPDATE SET \
         nomination_seconds = excluded.nomination_seconds, \
         bid_seconds = excluded.bid_seconds, \
         quiet_hours_enabled = excluded.quiet_hours_enabled, \
         quiet_start_minute = excluded.quiet_start_minute, \
         quiet_end_minute = excluded.quiet_end_minute, \
         quiet_utc_offset_minutes = excluded.quiet_utc_offset_minutes, \
         updated_at = excluded.updated_at",
    )
    .bind(draft_id)
    .bind(update.nomination_seconds)
    .bind(update.bid_seconds)
    .bind(update.quiet_hours_enabled)
    .bind(update.quiet_start_minute)
    .bind(update.quiet_end_minute)
    .bind(update.quiet_utc_offset_minutes)
    .bind(now)
    .execute(pool)
    .await?;

    events::log_event(
        pool,
        draft_id,
        EventType::SettingsChange,
        serde_json::json!({
            "nomination_seconds": update.nomination_seconds,
            "bid_seconds": update.bid_seconds,
            "quiet_hours_enabled": update.quiet_hours_enabled,
            "quiet_start_minute": update.quiet_start_minute,
            "quiet_end_minute": update.quiet_end_minute,
        }),
        now,
    )
    .await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TeamImportRow {
    pub name: String,
    pub code: String,
    pub budget: i64,
    pub spots: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerImportRow {
    pub name: String,
    pub position_primary: String,
    #[serde(default)]
    pub position_secondary: Option<String>,
}

/// Upsert teams by (draft, name); fresh rows start with full budget and
/// roster. `replace` wipes the draft's teams first, and is refused while
/// the draft has any open auction or drafted player.
pub async fn import_teams(
    pool: &SqlitePool,
    draft_id: &str,
    rows: &[TeamImportRow],
    replace: bool,
    now: i64,
) -> Result<usize> {
    if rows.is_empty() {
        return Err(AppError::Validation("No team rows found".to_string()));
    }
    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx + 1;
        if row.name.trim().is_empty() {
            return Err(AppError::Validation(format!("Row {row_num}: missing name")));
        }
        if row.code.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Row {row_num}: missing code for \"{}\"",
                row.name
            )));
        }
        if row.budget <= 0 {
            return Err(AppError::Validation(format!(
                "Row {row_num}: invalid budget for \"{}\"",
                row.name
            )));
        }
        if row.spots <= 0 {
            return Err(AppError::Validation(format!(
                "Row {row_num}: invalid spots for \"{}\"",
                row.name
            )));
        }
    }

    if replace {
        let open_auctions: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM auctions WHERE draft_id = ? AND closed_at IS NULL",
        )
        .bind(draft_id)
        .fetch_one(pool)
        .await?;
        let drafted: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM players WHERE draft_id = ? AND drafted_by_team_id IS NOT NULL",
        )
        .bind(draft_id)
        .fetch_one(pool)
        .await?;
        if open_auctions > 0 || drafted > 0 {
            return Err(AppError::Validation(format!(
                "Cannot replace teams while draft has data. Auctions: {open_auctions}, \
                 Drafted players: {drafted}. Run reset first."
            )));
        }
        sqlx::query("DELETE FROM teams WHERE draft_id = ?")
            .bind(draft_id)
            .execute(pool)
            .await?;
    }

    for row in rows {
        sqlx::query(
            "INSERT INTO teams (id, draft_id, name, join_code, budget_total, budget_remaining, \
             roster_spots_total, roster_spots_remaining, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (draft_id, name) DO UPDATE SET \
             join_code = excluded.join_code, \
             budget_total = excluded.budget_total, \
             budget_remaining = excluded.budget_remaining, \
             roster_spots_total = excluded.roster_spots_total, \
             roster_spots_remaining = excluded.roster_spots_remaining",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(draft_id)
        .bind(row.name.trim())
        .bind(row.code.trim())
        .bind(row.budget)
        .bind(row.budget)
        .bind(row.spots)
        .bind(row.spots)
        .bind(now)
        .execute(pool)
        .await?;
    }

    info!(draft_id, count = rows.len(), replace, "teams imported");
    events::log_event(
        pool,
        draft_id,
        EventType::ImportTeams,
        serde_json::json!({ "count": rows.len(), "replace": replace }),
        now,
    )
    .await;
    Ok(rows.len())
}

/// Upsert players by (draft, name), validating positions against the
/// eligibility tables. Draft status is never touched by a re-import.
pub async fn import_players(
    pool: &SqlitePool,
    draft_id: &str,
    rows: &[PlayerImportRow],
    now: i64,
) -> Result<usize> {
    if rows.is_empty() {
        return Err(AppError::Validation("No player rows found".to_string()));
    }

    let mut parsed: Vec<(String, PrimaryPosition, Option<SecondaryPosition>)> = Vec::new();
    for row in rows {
        let name = row.name.trim();
        if name.is_empty() {
            continue;
        }
        let primary = PrimaryPosition::parse(&row.position_primary).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid primary position \"{}\" for \"{name}\"",
                row.position_primary
            ))
        })?;
        let secondary = match row.position_secondary.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(SecondaryPosition::parse(code).ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid secondary position \"{code}\" for \"{name}\""
                ))
            })?),
        };
        parsed.push((name.to_string(), primary, secondary));
    }
    if parsed.is_empty() {
        return Err(AppError::Validation("No valid player rows found".to_string()));
    }

    for (name, primary, secondary) in &parsed {
        sqlx::query(
            "INSERT INTO players (id, draft_id, name, position_primary, position_secondary, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (draft_id, name) DO UPDATE SET \
             position_primary = excluded.position_primary, \
             position_secondary = excluded.position_secondary",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(draft_id)
        .bind(name)
        .bind(primary.code())
        .bind(secondary.map(|s| s.code()))
        .bind(now)
        .execute(pool)
        .await?;
    }

    info!(draft_id, count = parsed.len(), "players imported");
    events::log_event(
        pool,
        draft_id,
        EventType::ImportPlayers,
        serde_json::json!({ "count": parsed.len() }),
        now,
    )
    .await;
    Ok(parsed.len())
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

/// Wipe all auctions and restore every team and player to pre-draft state.
/// One transaction so a crash can't leave half a draft reset.
pub async fn reset_draft(pool: &SqlitePool, draft_id: &str, now: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM auctions WHERE draft_id = ?")
        .bind(draft_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "UPDATE players SET drafted_by_team_id = NULL, winning_bid = NULL WHERE draft_id = ?",
    )
    .bind(draft_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "UPDATE teams SET budget_remaining = budget_total, \
         roster_spots_remaining = roster_spots_total WHERE draft_id = ?",
    )
    .bind(draft_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "INSERT INTO draft_events (draft_id, event_type, payload, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(draft_id)
    .bind(EventType::Reset.to_string())
    .bind("{}")
    .bind(now)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(draft_id, "draft reset");
    Ok(())
}
