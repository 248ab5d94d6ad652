//! Terminal state machine for an auction: OPEN -> (expired) -> AWARDED, or
//! closed with no bids. Three independent triggers funnel through
//! `finalize` — the periodic sweeper, an admin force, and an admin manual
//! close — so the whole award is one conditional transaction guarded by a
//! compare-and-set on `closed_at`. Only the first caller to claim the
//! terminal marker applies any side effect; everyone else observes the
//! idempotent `already_closed` short-circuit.

use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::models::AuctionRow;
use crate::error::{AppError, Result};
use crate::types::{EventType, FinalizeStatus};

pub async fn finalize(
    pool: &SqlitePool,
    draft_id: &str,
    auction_id: &str,
    now: i64,
    force: bool,
) -> Result<FinalizeStatus> {
    let mut tx = pool.begin().await?;

    let auction: Option<AuctionRow> = sqlx::query_as("SELECT * FROM auctions WHERE id = ?")
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(auction) = auction else {
        return Err(AppError::NotFound("Auction"));
    };
    if auction.draft_id != draft_id {
        return Err(AppError::Validation(
            "Auction does not belong to this draft".to_string(),
        ));
    }
    if auction.closed_at.is_some() {
        return Ok(FinalizeStatus::AlreadyClosed);
    }
    if !force && !crate::clock::is_expired(&auction, now) {
        return Err(AppError::NotExpiredYet);
    }

    // Claim the terminal marker. Zero rows means a concurrent caller won
    // the race after our read; their transaction did the award.
    let claimed = sqlx::query("UPDATE auctions SET closed_at = ? WHERE id = ? AND closed_at IS NULL")
        .bind(now)
        .bind(auction_id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        return Ok(FinalizeStatus::AlreadyClosed);
    }

    let Some(winner_id) = auction.high_team_id.as_deref() else {
        // Nobody bid; the auction just closes and the player stays
        // undrafted.
        append_event_tx(
            &mut tx,
            draft_id,
            serde_json::json!({
                "auction_id": auction_id,
                "player_id": auction.player_id,
                "status": FinalizeStatus::NoBids,
                "forced": force,
            }),
            now,
        )
        .await?;
        tx.commit().await?;
        info!(auction_id, "auction closed with no bids");
        return Ok(FinalizeStatus::NoBids);
    };

    // Charge the winner. The WHERE guards re-check budget and roster at
    // write time; losing either one means a race slipped past the bid-time
    // checks, and the whole award must roll back untouched.
    let charged = sqlx::query(
        "UPDATE teams \
         SET budget_remaining = budget_remaining - ?, \
             roster_spots_remaining = roster_spots_remaining - 1 \
         WHERE id = ? AND budget_remaining >= ? AND roster_spots_remaining > 0",
    )
    .bind(auction.high_bid)
    .bind(winner_id)
    .bind(auction.high_bid)
    .execute(&mut *tx)
    .await?;
    if charged.rows_affected() == 0 {
        tx.rollback().await?;
        error!(
            auction_id,
            winner_id,
            high_bid = auction.high_bid,
            "award aborted: winner has no budget or roster space; auction left open"
        );
        return Err(AppError::RosterOverflow);
    }

    let drafted = sqlx::query(
        "UPDATE players SET drafted_by_team_id = ?, winning_bid = ? \
         WHERE id = ? AND drafted_by_team_id IS NULL",
    )
    .bind(winner_id)
    .bind(auction.high_bid)
    .bind(&auction.player_id)
    .execute(&mut *tx)
    .await?;
    if drafted.rows_affected() == 0 {
        tx.rollback().await?;
        error!(
            auction_id,
            player_id = %auction.player_id,
            "award aborted: player already drafted elsewhere; auction left open"
        );
        return Err(AppError::AlreadyDrafted);
    }

    append_event_tx(
        &mut tx,
        draft_id,
        serde_json::json!({
            "auction_id": auction_id,
            "player_id": auction.player_id,
            "team_id": winner_id,
            "winning_bid": auction.high_bid,
            "status": FinalizeStatus::Awarded,
            "forced": force,
        }),
        now,
    )
    .await?;
    tx.commit().await?;

    info!(
        auction_id,
        winner_id,
        winning_bid = auction.high_bid,
        forced = force,
        "auction awarded"
    );
    Ok(FinalizeStatus::Awarded)
}

/// The finalize event is part of the award's atomic unit, so it is written
/// inside the transaction rather than through `events::log_event`.
async fn append_event_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    draft_id: &str,
    payload: serde_json::Value,
    now: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO draft_events (draft_id, event_type, payload, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(draft_id)
    .bind(EventType::Finalize.to_string())
    .bind(payload.to_string())
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub finalized: u64,
    pub errors: Vec<String>,
}

/// Close every expired, unpaused auction in a draft. Each candidate funnels
/// through `finalize`, so racing sweeps and admin actions stay safe; an
/// auction that another trigger already closed just counts as skipped.
pub async fn sweep_expired(pool: &SqlitePool, draft_id: &str, now: i64) -> Result<SweepOutcome> {
    let expired: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM auctions \
         WHERE draft_id = ? AND closed_at IS NULL AND paused = 0 AND ends_at <= ?",
    )
    .bind(draft_id)
    .bind(now)
    .fetch_all(pool)
    .await?;

    let mut outcome = SweepOutcome::default();
    for auction_id in &expired {
        match finalize(pool, draft_id, auction_id, now, false).await {
            Ok(FinalizeStatus::AlreadyClosed) => {}
            Ok(_) => outcome.finalized += 1,
            // NotExpiredYet here means a bid extended the deadline between
            // the select and the claim; that auction is simply not done.
            Err(AppError::NotExpiredYet) => {}
            Err(e) => outcome.errors.push(format!("{auction_id}: {e}")),
        }
    }
    Ok(outcome)
}
