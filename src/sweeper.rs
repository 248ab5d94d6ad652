//! Periodic finalization sweep. Deadlines are enforced lazily, so this task
//! is what guarantees an expired auction actually closes even when nobody
//! is clicking; it shares the idempotent `finalize` path with the admin
//! triggers, so overlap is harmless.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::time::interval;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::clock;
use crate::config::SWEEP_INTERVAL_SECS;
use crate::error::Result;
use crate::finalize::sweep_expired;

pub struct AuctionSweeper {
    pool: SqlitePool,
    health: Arc<HealthState>,
}

impl AuctionSweeper {
    pub fn new(pool: SqlitePool, health: Arc<HealthState>) -> Self {
        Self { pool, health }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            if let Err(e) = self.tick(clock::now_secs()).await {
                error!("Sweep failed: {e}");
            }
        }
    }

    async fn tick(&self, now: i64) -> Result<()> {
        let draft_ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT draft_id FROM auctions \
             WHERE closed_at IS NULL AND paused = 0 AND ends_at <= ?",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        for draft_id in &draft_ids {
            let outcome = sweep_expired(&self.pool, draft_id, now).await?;
            if outcome.finalized > 0 || !outcome.errors.is_empty() {
                info!(
                    draft_id = %draft_id,
                    finalized = outcome.finalized,
                    errors = outcome.errors.len(),
                    "sweep finalized {} auction(s)",
                    outcome.finalized,
                );
            }
            for err in &outcome.errors {
                error!(draft_id = %draft_id, "sweep finalize error: {err}");
            }
            self.health.add_finalized(outcome.finalized);
        }

        self.health.set_last_sweep_at(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::testutil;

    #[tokio::test]
    async fn tick_sweeps_every_draft_with_expired_auctions() {
        let pool = db::test_pool().await;
        let health = Arc::new(HealthState::new());

        let t1 = testutil::seed_team(&pool, "d1", "Sharks", "cats", 100, 5).await;
        let t2 = testutil::seed_team(&pool, "d2", "Jets", "dogs", 100, 5).await;
        let p1 = testutil::seed_player(&pool, "d1", "Alpha").await;
        let p2 = testutil::seed_player(&pool, "d2", "Bravo").await;
        let a1 = testutil::seed_auction(&pool, "d1", &p1, 600, Some((&t1.id, 10))).await;
        let a2 = testutil::seed_auction(&pool, "d2", &p2, 500, Some((&t2.id, 20))).await;

        let sweeper = AuctionSweeper::new(pool.clone(), Arc::clone(&health));
        sweeper.tick(700).await.unwrap();

        assert!(!db::get_auction(&pool, &a1).await.unwrap().unwrap().is_open());
        assert!(!db::get_auction(&pool, &a2).await.unwrap().unwrap().is_open());
        assert_eq!(health.auctions_finalized(), 2);
        assert_eq!(health.last_sweep_at(), 700);
    }
}
