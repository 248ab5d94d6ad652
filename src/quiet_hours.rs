//! Quiet hours: a recurring daily window during which every open auction's
//! countdown is frozen. Both directions are single bulk conditional
//! updates, so the tick is idempotent and safe to run from a cron, an
//! admin button, and the background scheduler at once.

use std::time::Duration;

use sqlx::SqlitePool;
use tokio::time::interval;
use tracing::{error, info};

use crate::clock;
use crate::config::QUIET_HOURS_TICK_SECS;
use crate::db;
use crate::error::Result;
use crate::events;
use crate::types::EventType;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct QuietOutcome {
    pub in_window: bool,
    pub paused: u64,
    pub resumed: u64,
}

/// Evaluate the window for one draft and pause or resume its open auctions.
///
/// Pausing freezes the remaining countdown into `paused_remaining_secs`;
/// resuming restores it relative to `now`, so an auction that entered the
/// window with five minutes left leaves it with five minutes left no matter
/// how long the window lasted.
pub async fn apply_quiet_hours(pool: &SqlitePool, draft_id: &str, now: i64) -> Result<QuietOutcome> {
    let settings = db::get_settings(pool, draft_id).await?;
    let in_window = settings.quiet_hours_enabled
        && clock::in_quiet_window(
            now,
            settings.quiet_utc_offset_minutes,
            settings.quiet_start_minute,
            settings.quiet_end_minute,
        );

    if in_window {
        let res = sqlx::query(
            "UPDATE auctions SET paused = 1, paused_remaining_secs = MAX(ends_at - ?, 0) \
             WHERE draft_id = ? AND closed_at IS NULL AND paused = 0",
        )
        .bind(now)
        .bind(draft_id)
        .execute(pool)
        .await?;
        let paused = res.rows_affected();
        if paused > 0 {
            info!(draft_id, paused, "quiet hours started; auctions paused");
            events::log_event(
                pool,
                draft_id,
                EventType::QuietPause,
                serde_json::json!({ "count": paused }),
                now,
            )
            .await;
        }
        Ok(QuietOutcome { in_window, paused, resumed: 0 })
    } else {
        let res = sqlx::query(
            "UPDATE auctions SET paused = 0, \
             ends_at = ? + COALESCE(paused_remaining_secs, 0), \
             paused_remaining_secs = NULL \
             WHERE draft_id = ? AND closed_at IS NULL AND paused = 1",
        )
        .bind(now)
        .bind(draft_id)
        .execute(pool)
        .await?;
        let resumed = res.rows_affected();
        if resumed > 0 {
            info!(draft_id, resumed, "quiet hours ended; auctions resumed");
            events::log_event(
                pool,
                draft_id,
                EventType::QuietResume,
                serde_json::json!({ "count": resumed }),
                now,
            )
            .await;
        }
        Ok(QuietOutcome { in_window, paused: 0, resumed })
    }
}

/// Background task re-evaluating the window for every draft that either has
/// quiet hours enabled or still has paused auctions (so disabling the
/// feature mid-window releases them on the next tick).
pub struct QuietHoursScheduler {
    pool: SqlitePool,
    health: std::sync::Arc<crate::api::health::HealthState>,
}

impl QuietHoursScheduler {
    pub fn new(pool: SqlitePool, health: std::sync::Arc<crate::api::health::HealthState>) -> Self {
        Self { pool, health }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(QUIET_HOURS_TICK_SECS));
        loop {
            ticker.tick().await;
            let now = clock::now_secs();
            if let Err(e) = self.tick(now).await {
                error!("Quiet-hours tick failed: {e}");
            } else {
                self.health.set_last_quiet_tick_at(now);
            }
        }
    }

    async fn tick(&self, now: i64) -> Result<()> {
        let draft_ids: Vec<String> = sqlx::query_scalar(
            "SELECT draft_id FROM draft_settings WHERE quiet_hours_enabled = 1 \
             UNION \
             SELECT DISTINCT draft_id FROM auctions WHERE closed_at IS NULL AND paused = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        for draft_id in &draft_ids {
            if let Err(e) = apply_quiet_hours(&self.pool, draft_id, now).await {
                error!(draft_id = %draft_id, "apply_quiet_hours failed: {e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    /// 22:55 on day one, in seconds.
    const T_2255: i64 = 22 * 3600 + 55 * 60;
    const T_2300: i64 = 23 * 3600;
    const T_0800_NEXT: i64 = 86_400 + 8 * 3600;

    #[tokio::test]
    async fn pause_freezes_and_resume_restores_remaining_time() {
        let pool = db::test_pool().await;
        // 23:00-08:00 window
        testutil::seed_quiet_settings(&pool, "d1", 23 * 60, 8 * 60).await;
        let player = testutil::seed_player(&pool, "d1", "Alpha").await;
        // Ten minutes left at 22:55.
        let auction = testutil::seed_auction(&pool, "d1", &player, T_2255 + 600, None).await;

        // Entering the window at 23:00 freezes the five remaining minutes.
        let out = apply_quiet_hours(&pool, "d1", T_2300).await.unwrap();
        assert_eq!(out, QuietOutcome { in_window: true, paused: 1, resumed: 0 });
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert!(row.paused);
        assert_eq!(row.paused_remaining_secs, Some(300));

        // Re-applying inside the window touches nothing.
        let out = apply_quiet_hours(&pool, "d1", T_2300 + 3600).await.unwrap();
        assert_eq!(out, QuietOutcome { in_window: true, paused: 0, resumed: 0 });

        // Leaving the window at 08:00 restores the five minutes.
        let out = apply_quiet_hours(&pool, "d1", T_0800_NEXT).await.unwrap();
        assert_eq!(out, QuietOutcome { in_window: false, paused: 0, resumed: 1 });
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert!(!row.paused);
        assert!(row.paused_remaining_secs.is_none());
        assert_eq!(row.ends_at, T_0800_NEXT + 300);
        assert!(row.seconds_remaining(T_0800_NEXT) >= 300);
    }

    #[tokio::test]
    async fn repeated_pause_resume_cycles_only_consume_unpaused_time() {
        let pool = db::test_pool().await;
        testutil::seed_quiet_settings(&pool, "d1", 23 * 60, 8 * 60).await;
        let player = testutil::seed_player(&pool, "d1", "Alpha").await;
        // Five minutes on the clock at 23:00.
        let auction = testutil::seed_auction(&pool, "d1", &player, T_2300 + 300, None).await;

        // Pause at 23:00, admin toggles the feature off a minute in (resume),
        // back on a minute later (pause again).
        apply_quiet_hours(&pool, "d1", T_2300).await.unwrap();
        sqlx::query("UPDATE draft_settings SET quiet_hours_enabled = 0 WHERE draft_id = 'd1'")
            .execute(&pool)
            .await
            .unwrap();
        apply_quiet_hours(&pool, "d1", T_2300 + 60).await.unwrap();
        sqlx::query("UPDATE draft_settings SET quiet_hours_enabled = 1 WHERE draft_id = 'd1'")
            .execute(&pool)
            .await
            .unwrap();
        apply_quiet_hours(&pool, "d1", T_2300 + 120).await.unwrap();

        // Only the one unpaused minute burned off: 300 - 60 = 240 frozen.
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert!(row.paused);
        assert_eq!(row.paused_remaining_secs, Some(240));

        // Final resume at 08:00 restores those four minutes.
        apply_quiet_hours(&pool, "d1", T_0800_NEXT).await.unwrap();
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.ends_at, T_0800_NEXT + 240);
    }

    #[tokio::test]
    async fn already_expired_auction_pauses_at_zero_not_negative() {
        let pool = db::test_pool().await;
        testutil::seed_quiet_settings(&pool, "d1", 23 * 60, 8 * 60).await;
        let player = testutil::seed_player(&pool, "d1", "Alpha").await;
        // Deadline passed before the window started; the sweeper just
        // hasn't gotten to it.
        let auction = testutil::seed_auction(&pool, "d1", &player, T_2300 - 10, None).await;

        apply_quiet_hours(&pool, "d1", T_2300).await.unwrap();
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.paused_remaining_secs, Some(0));

        apply_quiet_hours(&pool, "d1", T_0800_NEXT).await.unwrap();
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert_eq!(row.ends_at, T_0800_NEXT, "expires immediately, never in the past");
    }

    #[tokio::test]
    async fn disabling_the_feature_releases_paused_auctions() {
        let pool = db::test_pool().await;
        testutil::seed_quiet_settings(&pool, "d1", 23 * 60, 8 * 60).await;
        let player = testutil::seed_player(&pool, "d1", "Alpha").await;
        let auction = testutil::seed_auction(&pool, "d1", &player, T_2300 + 120, None).await;

        apply_quiet_hours(&pool, "d1", T_2300).await.unwrap();
        sqlx::query("UPDATE draft_settings SET quiet_hours_enabled = 0 WHERE draft_id = 'd1'")
            .execute(&pool)
            .await
            .unwrap();

        // Mid-window, but the feature is off: resume.
        let out = apply_quiet_hours(&pool, "d1", T_2300 + 60).await.unwrap();
        assert_eq!(out.resumed, 1);
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert!(!row.paused);
        assert_eq!(row.ends_at, T_2300 + 60 + 120);
    }

    #[tokio::test]
    async fn drafts_without_quiet_hours_are_untouched() {
        let pool = db::test_pool().await;
        testutil::seed_settings(&pool, "d1", 600, 120).await;
        let player = testutil::seed_player(&pool, "d1", "Alpha").await;
        let auction = testutil::seed_auction(&pool, "d1", &player, T_2300 + 600, None).await;

        let out = apply_quiet_hours(&pool, "d1", T_2300).await.unwrap();
        assert_eq!(out, QuietOutcome::default());
        let row = db::get_auction(&pool, &auction).await.unwrap().unwrap();
        assert!(!row.paused);
    }
}
