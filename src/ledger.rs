//! Spendable-budget queries. Pure reads; recomputed from the live set of
//! open auctions on every call because any other auction's high bid can
//! change between two bids.

use sqlx::SqlitePool;

use crate::db::models::{AuctionRow, TeamRow};
use crate::error::Result;

/// Sum of the team's current high bids across all open auctions.
pub async fn committed_budget(pool: &SqlitePool, team: &TeamRow) -> Result<i64> {
    let committed: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(high_bid), 0) FROM auctions \
         WHERE draft_id = ? AND closed_at IS NULL AND high_team_id = ?",
    )
    .bind(&team.draft_id)
    .bind(&team.id)
    .fetch_one(pool)
    .await?;
    Ok(committed)
}

/// True spendable budget: `budget_remaining` minus everything committed to
/// open high bids.
///
/// When `excluding` is the auction being bid on and this team already holds
/// its high bid, that commitment is credited back: a team raising its own
/// bid is not charged twice for the same auction.
pub async fn available_budget(
    pool: &SqlitePool,
    team: &TeamRow,
    excluding: Option<&AuctionRow>,
) -> Result<i64> {
    let committed = committed_budget(pool, team).await?;
    let credit = excluding
        .filter(|a| a.high_team_id.as_deref() == Some(team.id.as_str()))
        .map(|a| a.high_bid)
        .unwrap_or(0);
    Ok((team.budget_remaining - (committed - credit)).max(0))
}
