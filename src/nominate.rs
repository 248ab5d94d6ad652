//! Opens a new auction for an undrafted player. The one-open-auction-per-
//! player rule is enforced by the partial unique index on the auctions
//! table, so two simultaneous nominations cannot both slip through an
//! application-level existence check.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::clock;
use crate::db;
use crate::error::{AppError, Result};
use crate::events;
use crate::types::EventType;

pub async fn nominate(
    pool: &SqlitePool,
    draft_id: &str,
    player_id: &str,
    now: i64,
) -> Result<String> {
    let player = db::get_player(pool, player_id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;
    if player.draft_id != draft_id {
        return Err(AppError::Validation(
            "Player does not belong to this draft".to_string(),
        ));
    }
    if player.drafted_by_team_id.is_some() {
        return Err(AppError::AlreadyDrafted);
    }

    let settings = db::get_settings(pool, draft_id).await?;
    let ends_at = clock::deadline_after_nomination(now, settings.nomination_seconds);

    let auction_id = Uuid::new_v4().to_string();
    let res = sqlx::query(
        "INSERT INTO auctions (id, draft_id, player_id, high_bid, high_team_id, ends_at, created_at) \
         VALUES (?, ?, ?, 0, NULL, ?, ?)",
    )
    .bind(&auction_id)
    .bind(draft_id)
    .bind(player_id)
    .bind(ends_at)
    .bind(now)
    .execute(pool)
    .await;

    match res {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::DuplicateAuction);
        }
        Err(e) => return Err(e.into()),
    }

    info!(draft_id, player = %player.name, auction_id, ends_at, "auction opened");
    events::log_event(
        pool,
        draft_id,
        EventType::Nominate,
        serde_json::json!({
            "auction_id": auction_id,
            "player_id": player_id,
            "ends_at": ends_at,
        }),
        now,
    )
    .await;

    Ok(auction_id)
}
