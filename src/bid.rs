//! Bid validation and application. One bid touches exactly one auction row;
//! the write is a compare-and-set against the state the bidder observed, so
//! concurrent bids on the same auction serialize through the storage layer
//! and the loser re-validates once against the fresh row.

use sqlx::SqlitePool;
use tracing::info;

use crate::clock;
use crate::config::MIN_BID_INCREMENT;
use crate::db::{self, models::AuctionRow, models::TeamRow};
use crate::error::{AppError, Result};
use crate::events;
use crate::ledger;
use crate::types::EventType;

#[derive(Debug, Clone)]
pub struct BidAccepted {
    pub auction_id: String,
    pub team_id: String,
    pub amount: i64,
    /// Stored deadline after the bid. Stale while the auction is paused;
    /// `seconds_remaining` is the number a UI should show either way.
    pub ends_at: i64,
    pub seconds_remaining: i64,
}

pub async fn place_bid(
    pool: &SqlitePool,
    draft_id: &str,
    auction_id: &str,
    join_code: &str,
    amount: i64,
    now: i64,
) -> Result<BidAccepted> {
    if amount <= 0 {
        return Err(AppError::Validation("Bid amount must be positive".to_string()));
    }

    let team = db::get_team_by_code(pool, draft_id, join_code)
        .await?
        .ok_or(AppError::InvalidTeamCode)?;

    // The settings snapshot for this operation. Re-read per request, never
    // a process singleton.
    let settings = db::get_settings(pool, draft_id).await?;

    // One internal retry: if the conditional write loses to a concurrent
    // bid, re-validate everything against the fresh row. The second bidder
    // to reach the write still wins if they beat the new minimum.
    for attempt in 0..2 {
        let auction = db::get_auction(pool, auction_id)
            .await?
            .ok_or(AppError::NotFound("Auction"))?;
        if auction.draft_id != draft_id {
            return Err(AppError::Validation(
                "Auction does not belong to this draft".to_string(),
            ));
        }

        let update = validate_bid(pool, &auction, &team, amount, settings.bid_seconds, now).await?;

        let applied = apply_bid(pool, &auction, &team.id, amount, now, &update).await?;
        if !applied {
            if attempt == 0 {
                continue;
            }
            return Err(AppError::BidConflict);
        }

        let seconds_remaining = if auction.paused {
            update.paused_remaining_secs.unwrap_or(0)
        } else {
            update.ends_at - now
        };
        info!(
            auction_id,
            team = %team.name,
            amount,
            ends_at = update.ends_at,
            "bid accepted"
        );
        events::log_event(
            pool,
            draft_id,
            EventType::Bid,
            serde_json::json!({
                "auction_id": auction_id,
                "team_id": team.id,
                "player_id": auction.player_id,
                "amount": amount,
                "ends_at": update.ends_at,
            }),
            now,
        )
        .await;

        return Ok(BidAccepted {
            auction_id: auction_id.to_string(),
            team_id: team.id.clone(),
            amount,
            ends_at: update.ends_at,
            seconds_remaining,
        });
    }
    unreachable!("bid retry loop returns on both attempts")
}

/// Deadline fields to write alongside the new high bid.
#[derive(Debug, Clone)]
struct ClockUpdate {
    ends_at: i64,
    paused_remaining_secs: Option<i64>,
}

/// Preconditions in a fixed order; first failure wins.
async fn validate_bid(
    pool: &SqlitePool,
    auction: &AuctionRow,
    team: &TeamRow,
    amount: i64,
    bid_seconds: i64,
    now: i64,
) -> Result<ClockUpdate> {
    if !auction.is_open() {
        return Err(AppError::AuctionEnded);
    }

    // Deadline check. While paused the countdown is frozen, so the stale
    // ends_at is ignored and the frozen remainder decides instead.
    if auction.paused {
        if auction.paused_remaining_secs.unwrap_or(0) <= 0 {
            return Err(AppError::AuctionEnded);
        }
    } else if now > auction.ends_at {
        return Err(AppError::AuctionEnded);
    }

    if team.roster_spots_remaining <= 0 {
        return Err(AppError::NoRosterSpace);
    }

    let min = auction.high_bid + MIN_BID_INCREMENT;
    if amount < min {
        return Err(AppError::BidTooLow { min });
    }

    let available = ledger::available_budget(pool, team, Some(auction)).await?;
    if amount > available {
        return Err(AppError::InsufficientBudget { available });
    }

    // Anti-snipe. For a paused auction the guarantee is applied to the
    // frozen remainder, so it survives the resume.
    if auction.paused {
        let remaining = auction.paused_remaining_secs.unwrap_or(0).max(bid_seconds);
        Ok(ClockUpdate {
            ends_at: auction.ends_at,
            paused_remaining_secs: Some(remaining),
        })
    } else {
        Ok(ClockUpdate {
            ends_at: clock::deadline_after_bid(auction.ends_at, now, bid_seconds),
            paused_remaining_secs: None,
        })
    }
}

/// Conditional write: succeeds only if the auction still looks exactly like
/// the row the bidder validated against. Returns false when a concurrent
/// writer got there first. The guard includes `paused` so a quiet-hours
/// transition between read and write can never have its frozen countdown
/// overwritten by a bid validated against the other state.
async fn apply_bid(
    pool: &SqlitePool,
    observed: &AuctionRow,
    team_id: &str,
    amount: i64,
    now: i64,
    update: &ClockUpdate,
) -> Result<bool> {
    let res = sqlx::query(
        "UPDATE auctions \
         SET high_bid = ?, high_team_id = ?, last_bid_at = ?, ends_at = ?, paused_remaining_secs = ? \
         WHERE id = ? AND closed_at IS NULL AND high_bid = ? AND high_team_id IS ? AND paused = ?",
    )
    .bind(amount)
    .bind(team_id)
    .bind(now)
    .bind(update.ends_at)
    .bind(update.paused_remaining_secs)
    .bind(&observed.id)
    .bind(observed.high_bid)
    .bind(&observed.high_team_id)
    .bind(observed.paused)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::testutil;

    async fn fixture(pool: &SqlitePool) -> (TeamRow, String) {
        testutil::seed_settings(pool, "d1", 600, 120).await;
        let team = testutil::seed_team(pool, "d1", "Sharks", "cats", 100, 5).await;
        let player = testutil::seed_player(pool, "d1", "Alpha").await;
        let auction = testutil::seed_auction(pool, "d1", &player, 600, None).await;
        (team, auction)
    }

    #[tokio::test]
    async fn accepted_bids_extend_the_deadline_monotonically() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;
        testutil::seed_team(&pool, "d1", "Jets", "dogs", 100, 5).await;

        // nomination window ends at 600; a bid at 550 pushes to 670
        let b1 = place_bid(&pool, "d1", &auction, "cats", 10, 550).await.unwrap();
        assert_eq!(b1.ends_at, 670);

        // a raise at 660 pushes to 780
        let b2 = place_bid(&pool, "d1", &auction, "dogs", 20, 660).await.unwrap();
        assert_eq!(b2.ends_at, 780);

        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.high_bid, 20);
        assert_eq!(row.ends_at, 780);
        assert_eq!(row.last_bid_at, Some(660));
    }

    #[tokio::test]
    async fn early_bid_leaves_deadline_alone() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;

        let b = place_bid(&pool, "d1", &auction, "cats", 5, 10).await.unwrap();
        assert_eq!(b.ends_at, 600);
    }

    #[tokio::test]
    async fn bid_after_deadline_is_rejected() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;

        let err = place_bid(&pool, "d1", &auction, "cats", 5, 601).await.unwrap_err();
        assert!(matches!(err, AppError::AuctionEnded));
    }

    #[tokio::test]
    async fn bid_on_closed_auction_is_rejected() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;
        sqlx::query("UPDATE auctions SET closed_at = 100 WHERE id = ?")
            .bind(&auction)
            .execute(&pool)
            .await
            .unwrap();

        let err = place_bid(&pool, "d1", &auction, "cats", 5, 200).await.unwrap_err();
        assert!(matches!(err, AppError::AuctionEnded));
    }

    #[tokio::test]
    async fn full_roster_cannot_bid() {
        let pool = db::test_pool().await;
        let (team, auction) = fixture(&pool).await;
        sqlx::query("UPDATE teams SET roster_spots_remaining = 0 WHERE id = ?")
            .bind(&team.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = place_bid(&pool, "d1", &auction, "cats", 5, 100).await.unwrap_err();
        assert!(matches!(err, AppError::NoRosterSpace));
    }

    #[tokio::test]
    async fn bid_must_beat_minimum_increment() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;
        testutil::seed_team(&pool, "d1", "Jets", "dogs", 100, 5).await;

        place_bid(&pool, "d1", &auction, "cats", 10, 100).await.unwrap();
        let err = place_bid(&pool, "d1", &auction, "dogs", 10, 110).await.unwrap_err();
        assert!(matches!(err, AppError::BidTooLow { min: 11 }));
    }

    #[tokio::test]
    async fn committed_bids_cap_spending_elsewhere() {
        let pool = db::test_pool().await;
        testutil::seed_settings(&pool, "d1", 600, 120).await;
        let team = testutil::seed_team(&pool, "d1", "Sharks", "cats", 80, 5).await;

        let p1 = testutil::seed_player(&pool, "d1", "Alpha").await;
        let p2 = testutil::seed_player(&pool, "d1", "Bravo").await;
        let p3 = testutil::seed_player(&pool, "d1", "Charlie").await;
        testutil::seed_auction(&pool, "d1", &p1, 600, Some((&team.id, 25))).await;
        testutil::seed_auction(&pool, "d1", &p2, 600, Some((&team.id, 25))).await;
        let third = testutil::seed_auction(&pool, "d1", &p3, 600, None).await;

        // 50 committed against budget_remaining 80 leaves 30; a 40 bid on a
        // third auction must bounce.
        let err = place_bid(&pool, "d1", &third, "cats", 40, 100).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientBudget { available: 30 }));

        // 30 itself is fine.
        place_bid(&pool, "d1", &third, "cats", 30, 100).await.unwrap();
    }

    #[tokio::test]
    async fn raising_own_high_bid_uses_the_credit() {
        let pool = db::test_pool().await;
        testutil::seed_settings(&pool, "d1", 600, 120).await;
        let team = testutil::seed_team(&pool, "d1", "Sharks", "cats", 100, 5).await;
        let p1 = testutil::seed_player(&pool, "d1", "Alpha").await;
        let auction = testutil::seed_auction(&pool, "d1", &p1, 600, Some((&team.id, 40))).await;

        // 40 is already committed here; raising to 70 must pass because the
        // existing commitment is credited back.
        let b = place_bid(&pool, "d1", &auction, "cats", 70, 100).await.unwrap();
        assert_eq!(b.amount, 70);
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.high_bid, 70);
    }

    #[tokio::test]
    async fn stale_observation_misses_the_conditional_write() {
        let pool = db::test_pool().await;
        let (team, auction) = fixture(&pool).await;

        let observed = db::get_auction(&pool, &auction).await.unwrap().unwrap();

        // A rival's bid lands between observation and write.
        let rival = testutil::seed_team(&pool, "d1", "Jets", "dogs", 100, 5).await;
        place_bid(&pool, "d1", &auction, "dogs", 7, 50).await.unwrap();

        let update = ClockUpdate { ends_at: 700, paused_remaining_secs: None };
        let applied = apply_bid(&pool, &observed, &team.id, 9, 60, &update).await.unwrap();
        assert!(!applied, "stale high_bid/high_team must touch zero rows");

        // The rival's bid is untouched.
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.high_bid, 7);
        assert_eq!(row.high_team_id.as_deref(), Some(rival.id.as_str()));
    }

    #[tokio::test]
    async fn pause_landing_mid_bid_voids_the_stale_write() {
        let pool = db::test_pool().await;
        let (team, auction) = fixture(&pool).await;

        let observed = db::get_auction(&pool, &auction).await.unwrap().unwrap();

        // Quiet hours pause the auction between the bidder's read and write.
        sqlx::query("UPDATE auctions SET paused = 1, paused_remaining_secs = 200 WHERE id = ?")
            .bind(&auction)
            .execute(&pool)
            .await
            .unwrap();

        let update = ClockUpdate { ends_at: 700, paused_remaining_secs: None };
        let applied = apply_bid(&pool, &observed, &team.id, 5, 400, &update).await.unwrap();
        assert!(!applied, "a write validated against the unpaused row must miss");

        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.paused_remaining_secs, Some(200), "frozen countdown intact");
    }

    #[tokio::test]
    async fn paused_auction_accepts_bids_and_freezes_the_guarantee() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;
        sqlx::query("UPDATE auctions SET paused = 1, paused_remaining_secs = 50 WHERE id = ?")
            .bind(&auction)
            .execute(&pool)
            .await
            .unwrap();

        // now is past the stale ends_at, but the frozen countdown governs.
        let b = place_bid(&pool, "d1", &auction, "cats", 5, 900).await.unwrap();
        assert_eq!(b.seconds_remaining, 120, "anti-snipe applies to the frozen remainder");

        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert!(row.paused);
        assert_eq!(row.paused_remaining_secs, Some(120));
        assert_eq!(row.ends_at, 600, "stored deadline untouched until resume");
    }

    #[tokio::test]
    async fn unknown_join_code_is_unauthorized() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;

        let err = place_bid(&pool, "d1", &auction, "nope", 5, 100).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTeamCode));
    }

    #[tokio::test]
    async fn non_positive_amount_is_invalid() {
        let pool = db::test_pool().await;
        let (_, auction) = fixture(&pool).await;

        let err = place_bid(&pool, "d1", &auction, "cats", 0, 100).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
