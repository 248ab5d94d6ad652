//! Row types for sqlx typed queries. One struct per table, matching the
//! schema in migrations/0001_init.sql.

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeamRow {
    pub id: String,
    pub draft_id: String,
    pub name: String,
    pub join_code: String,
    pub budget_total: i64,
    pub budget_remaining: i64,
    pub roster_spots_total: i64,
    pub roster_spots_remaining: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    pub id: String,
    pub draft_id: String,
    pub name: String,
    pub position_primary: String,
    pub position_secondary: Option<String>,
    pub drafted_by_team_id: Option<String>,
    pub winning_bid: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuctionRow {
    pub id: String,
    pub draft_id: String,
    pub player_id: String,
    /// 0 means no bids yet; high_bid > 0 implies high_team_id is set.
    pub high_bid: i64,
    pub high_team_id: Option<String>,
    /// Authoritative deadline, Unix seconds. Stale while paused; the frozen
    /// countdown lives in `paused_remaining_secs` until resume.
    pub ends_at: i64,
    pub last_bid_at: Option<i64>,
    pub paused: bool,
    pub paused_remaining_secs: Option<i64>,
    pub created_at: i64,
    /// NULL means open. Set exactly once; the compare-and-set guard for the
    /// whole finalization transaction.
    pub closed_at: Option<i64>,
}

impl AuctionRow {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Seconds left on the countdown as a UI would display it.
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        if self.paused {
            self.paused_remaining_secs.unwrap_or(0)
        } else {
            crate::clock::remaining_secs(self.ends_at, now)
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingsRow {
    pub draft_id: String,
    pub nomination_seconds: i64,
    pub bid_seconds: i64,
    pub quiet_hours_enabled: bool,
    pub quiet_start_minute: i64,
    pub quiet_end_minute: i64,
    pub quiet_utc_offset_minutes: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub draft_id: String,
    pub event_type: String,
    pub payload: String,
    pub created_at: i64,
}
