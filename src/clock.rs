//! Deadline and quiet-window arithmetic for a single auction.
//!
//! Every function here is pure over explicit timestamps so the operations in
//! `bid`, `finalize`, and `quiet_hours` stay deterministic functions of
//! (state, settings, input). Wall-clock sampling happens once per request at
//! the call site.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::MINUTES_PER_DAY;
use crate::db::models::AuctionRow;

/// Coarse wall clock, Unix seconds.
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Initial countdown for a freshly nominated auction.
pub fn deadline_after_nomination(now: i64, nomination_seconds: i64) -> i64 {
    now + nomination_seconds
}

/// Anti-snipe rule: an accepted bid leaves at least `bid_seconds` on the
/// clock, and the deadline only ever moves forward.
pub fn deadline_after_bid(ends_at: i64, now: i64, bid_seconds: i64) -> i64 {
    ends_at.max(now + bid_seconds)
}

/// Remaining countdown, floored at zero. Also the value frozen into
/// `paused_remaining_secs` when quiet hours pause an auction.
pub fn remaining_secs(ends_at: i64, now: i64) -> i64 {
    (ends_at - now).max(0)
}

/// New deadline when quiet hours end. The frozen remainder is restored
/// relative to `now`, so elapsed pause time never eats into the countdown.
pub fn deadline_after_resume(now: i64, remaining_secs: i64) -> i64 {
    now + remaining_secs.max(0)
}

/// True once the deadline has passed on an open, unpaused auction. Paused
/// auctions never expire; their countdown is frozen in
/// `paused_remaining_secs`.
pub fn is_expired(auction: &AuctionRow, now: i64) -> bool {
    !auction.paused && auction.closed_at.is_none() && now >= auction.ends_at
}

/// Whether `now` falls inside the recurring daily quiet window.
///
/// `start_minute`/`end_minute` are minute-of-day in a fixed timezone given
/// by `utc_offset_minutes`. The window is half-open `[start, end)` and may
/// wrap midnight (start > end). `start == end` means an empty window.
pub fn in_quiet_window(
    now: i64,
    utc_offset_minutes: i64,
    start_minute: i64,
    end_minute: i64,
) -> bool {
    if start_minute == end_minute {
        return false;
    }
    let minute = minute_of_day(now, utc_offset_minutes);
    if start_minute < end_minute {
        minute >= start_minute && minute < end_minute
    } else {
        minute >= start_minute || minute < end_minute
    }
}

fn minute_of_day(now: i64, utc_offset_minutes: i64) -> i64 {
    let local_secs = now + utc_offset_minutes * 60;
    (local_secs.rem_euclid(MINUTES_PER_DAY * 60)) / 60
}
