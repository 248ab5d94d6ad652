//! Append-only audit trail. Used for operator review and debugging, never
//! read back into decision logic, so most appenders treat failure as
//! non-fatal. The finalization path is the exception: its event rides the
//! award transaction in `finalize.rs`.

use sqlx::SqlitePool;
use tracing::warn;

use crate::error::Result;
use crate::types::EventType;

pub async fn append_event(
    pool: &SqlitePool,
    draft_id: &str,
    event_type: EventType,
    payload: serde_json::Value,
    now: i64,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO draft_events (draft_id, event_type, payload, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(draft_id)
    .bind(event_type.to_string())
    .bind(payload.to_string())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Best-effort append: the state change already committed, so a failed
/// audit write is logged and swallowed.
pub async fn log_event(
    pool: &SqlitePool,
    draft_id: &str,
    event_type: EventType,
    payload: serde_json::Value,
    now: i64,
) {
    if let Err(e) = append_event(pool, draft_id, event_type, payload, now).await {
        warn!(draft_id, event = %event_type, "audit event append failed: {e}");
    }
}
