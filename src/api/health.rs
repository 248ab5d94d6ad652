//! Shared liveness state for the /health endpoint.
//! Updated by AuctionSweeper and QuietHoursScheduler, read by the API.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Unix seconds of the last completed sweep tick (0 = none yet).
    pub last_sweep_at: AtomicI64,
    /// Lifetime count of auctions finalized by the background sweeper.
    pub auctions_finalized: AtomicU64,
    /// Unix seconds of the last quiet-hours evaluation (0 = none yet).
    pub last_quiet_tick_at: AtomicI64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_sweep_at(&self, secs: i64) {
        self.last_sweep_at.store(secs, Ordering::Relaxed);
    }

    pub fn add_finalized(&self, n: u64) {
        self.auctions_finalized.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set_last_quiet_tick_at(&self, secs: i64) {
        self.last_quiet_tick_at.store(secs, Ordering::Relaxed);
    }

    pub fn last_sweep_at(&self) -> i64 {
        self.last_sweep_at.load(Ordering::Relaxed)
    }

    pub fn auctions_finalized(&self) -> u64 {
        self.auctions_finalized.load(Ordering::Relaxed)
    }

    pub fn last_quiet_tick_at(&self) -> i64 {
        self.last_quiet_tick_at.load(Ordering::Relaxed)
    }
}
