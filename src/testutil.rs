//! Shared fixtures for the DB-backed unit tests. Compiled only for tests.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::TeamRow;

pub async fn seed_team(
    pool: &SqlitePool,
    draft_id: &str,
    name: &str,
    join_code: &str,
    budget: i64,
    spots: i64,
) -> TeamRow {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO teams (id, draft_id, name, join_code, budget_total, budget_remaining, \
         roster_spots_total, roster_spots_remaining, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)",
    )
    .bind(&id)
    .bind(draft_id)
    .bind(name)
    .bind(join_code)
    .bind(budget)
    .bind(budget)
    .bind(spots)
    .bind(spots)
    .execute(pool)
    .await
    .expect("seed team");
    crate::db::get_team(pool, &id).await.unwrap().unwrap()
}

pub async fn seed_player(pool: &SqlitePool, draft_id: &str, name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO players (id, draft_id, name, position_primary, created_at) \
         VALUES (?, ?, ?, 'SS', 0)",
    )
    .bind(&id)
    .bind(draft_id)
    .bind(name)
    .execute(pool)
    .await
    .expect("seed player");
    id
}

/// Insert an open auction directly, optionally with a standing high bid.
pub async fn seed_auction(
    pool: &SqlitePool,
    draft_id: &str,
    player_id: &str,
    ends_at: i64,
    high: Option<(&str, i64)>,
) -> String {
    let id = Uuid::new_v4().to_string();
    let (high_team_id, high_bid) = match high {
        Some((team_id, bid)) => (Some(team_id.to_string()), bid),
        None => (None, 0),
    };
    sqlx::query(
        "INSERT INTO auctions (id, draft_id, player_id, high_bid, high_team_id, ends_at, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0)",
    )
    .bind(&id)
    .bind(draft_id)
    .bind(player_id)
    .bind(high_bid)
    .bind(high_team_id)
    .bind(ends_at)
    .execute(pool)
    .await
    .expect("seed auction");
    id
}

pub async fn seed_settings(
    pool: &SqlitePool,
    draft_id: &str,
    nomination_seconds: i64,
    bid_seconds: i64,
) {
    sqlx::query(
        "INSERT INTO draft_settings (draft_id, nomination_seconds, bid_seconds, updated_at) \
         VALUES (?, ?, ?, 0)",
    )
    .bind(draft_id)
    .bind(nomination_seconds)
    .bind(bid_seconds)
    .execute(pool)
    .await
    .expect("seed settings");
}

pub async fn seed_quiet_settings(
    pool: &SqlitePool,
    draft_id: &str,
    start_minute: i64,
    end_minute: i64,
) {
    sqlx::query(
        "INSERT INTO draft_settings (draft_id, nomination_seconds, bid_seconds, \
         quiet_hours_enabled, quiet_start_minute, quiet_end_minute, updated_at) \
         VALUES (?, 600, 120, 1, ?, ?, 0) \
         ON CONFLICT (draft_id) DO UPDATE SET quiet_hours_enabled = 1, \
         quiet_start_minute = excluded.quiet_start_minute, \
         quiet_end_minute = excluded.quiet_end_minute",
    )
    .bind(draft_id)
    .bind(start_minute)
    .bind(end_minute)
    .execute(pool)
    .await
    .expect("seed quiet settings");
}
