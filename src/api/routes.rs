use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::admin::{self, PlayerImportRow, SettingsUpdate, TeamImportRow};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::bid;
use crate::clock;
use crate::db;
use crate::error::AppError;
use crate::finalize;
use crate::nominate;
use crate::quiet_hours;

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub admin_code: String,
    pub latency: Arc<LatencyStats>,
    pub health: Arc<HealthState>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/nominate", post(post_nominate))
        .route("/bid", post(post_bid))
        .route("/finalize", post(post_finalize))
        .route("/sweep", post(post_sweep))
        .route("/quiet-hours/tick", post(post_quiet_tick))
        .route("/settings", post(post_settings))
        .route("/join-team", post(post_join_team))
        .route("/import/teams", post(post_import_teams))
        .route("/import/players", post(post_import_players))
        .route("/reset", post(post_reset))
        .route("/drafts/:draft_id/auctions", get(get_auctions))
        .route("/drafts/:draft_id/teams", get(get_teams))
        .route("/drafts/:draft_id/players", get(get_players))
        .route("/drafts/:draft_id/events", get(get_events))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

/// Admin endpoints compare the x-admin-code header against ADMIN_CODE.
/// An unset code fails closed.
fn require_admin(state: &ApiState, headers: &HeaderMap) -> Result<(), AppError> {
    let presented = headers
        .get("x-admin-code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if state.admin_code.is_empty() || presented != state.admin_code {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct NominateBody {
    pub draft_id: String,
    pub player_id: String,
}

#[derive(Deserialize)]
pub struct BidBody {
    pub draft_id: String,
    pub auction_id: String,
    pub team_code: String,
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct FinalizeBody {
    pub draft_id: String,
    pub auction_id: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Deserialize)]
pub struct DraftBody {
    pub draft_id: String,
}

#[derive(Deserialize)]
pub struct SettingsBody {
    pub draft_id: String,
    #[serde(flatten)]
    pub settings: SettingsUpdate,
}

#[derive(Deserialize)]
pub struct JoinTeamBody {
    pub draft_id: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct ImportTeamsBody {
    pub draft_id: String,
    #[serde(default)]
    pub replace: bool,
    pub teams: Vec<TeamImportRow>,
}

#[derive(Deserialize)]
pub struct ImportPlayersBody {
    pub draft_id: String,
    pub players: Vec<PlayerImportRow>,
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AuctionsQuery {
    #[serde(default)]
    pub include_closed: bool,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct PlayersQuery {
    #[serde(default)]
    pub undrafted: bool,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct AuctionResponse {
    pub id: String,
    pub player_id: String,
    pub player_name: String,
    pub high_bid: i64,
    pub high_team_id: Option<String>,
    pub high_team_name: Option<String>,
    pub ends_at: i64,
    pub last_bid_at: Option<i64>,
    pub paused: bool,
    pub seconds_remaining: i64,
    pub closed_at: Option<i64>,
}

#[derive(Serialize)]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub budget_total: i64,
    pub budget_remaining: i64,
    pub roster_spots_total: i64,
    pub roster_spots_remaining: i64,
    pub committed: i64,
    pub available: i64,
}

#[derive(Serialize)]
pub struct PlayerResponse {
    pub id: String,
    pub name: String,
    pub position_primary: String,
    pub position_secondary: Option<String>,
    pub drafted_by_team_id: Option<String>,
    pub winning_bid: Option<i64>,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub id: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: i64,
}

// ---------------------------------------------------------------------------
// Mutating handlers
// ---------------------------------------------------------------------------

async fn post_nominate(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<NominateBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    let auction_id = nominate::nominate(
        &state.pool,
        &body.draft_id,
        &body.player_id,
        clock::now_secs(),
    )
    .await?;
    Ok(Json(serde_json::json!({ "ok": true, "auction_id": auction_id })))
}

async fn post_bid(
    State(state): State<ApiState>,
    Json(body): Json<BidBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let started = Instant::now();
    let result = bid::place_bid(
        &state.pool,
        &body.draft_id,
        &body.auction_id,
        body.team_code.trim(),
        body.amount,
        clock::now_secs(),
    )
    .await;
    state.latency.record(started.elapsed());
    let accepted = result?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "auction_id": accepted.auction_id,
        "team_id": accepted.team_id,
        "amount": accepted.amount,
        "ends_at": accepted.ends_at,
        "seconds_remaining": accepted.seconds_remaining,
    })))
}

async fn post_finalize(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<FinalizeBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    let status = finalize::finalize(
        &state.pool,
        &body.draft_id,
        &body.auction_id,
        clock::now_secs(),
        body.force,
    )
    .await?;
    Ok(Json(serde_json::json!({ "ok": true, "status": status })))
}

async fn post_sweep(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<DraftBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    let outcome = finalize::sweep_expired(&state.pool, &body.draft_id, clock::now_secs()).await?;
    Ok(Json(serde_json::json!({
        "finalized": outcome.finalized,
        "errors": outcome.errors,
    })))
}

async fn post_quiet_tick(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<DraftBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    let now = clock::now_secs();
    let outcome = quiet_hours::apply_quiet_hours(&state.pool, &body.draft_id, now).await?;
    state.health.set_last_quiet_tick_at(now);
    Ok(Json(serde_json::json!({
        "ok": true,
        "in_window": outcome.in_window,
        "paused": outcome.paused,
        "resumed": outcome.resumed,
    })))
}

async fn post_settings(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<SettingsBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    admin::save_settings(&state.pool, &body.draft_id, &body.settings, clock::now_secs()).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn post_join_team(
    State(state): State<ApiState>,
    Json(body): Json<JoinTeamBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let team = db::get_team_by_code(&state.pool, &body.draft_id, body.code.trim())
        .await?
        .ok_or(AppError::InvalidTeamCode)?;
    Ok(Json(serde_json::json!({
        "team_id": team.id,
        "team_name": team.name,
    })))
}

async fn post_import_teams(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ImportTeamsBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    let count = admin::import_teams(
        &state.pool,
        &body.draft_id,
        &body.teams,
        body.replace,
        clock::now_secs(),
    )
    .await?;
    Ok(Json(serde_json::json!({ "ok": true, "count": count })))
}

async fn post_import_players(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ImportPlayersBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    let count = admin::import_players(
        &state.pool,
        &body.draft_id,
        &body.players,
        clock::now_secs(),
    )
    .await?;
    Ok(Json(serde_json::json!({ "ok": true, "count": count })))
}

async fn post_reset(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<DraftBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &headers)?;
    admin::reset_draft(&state.pool, &body.draft_id, clock::now_secs()).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// ---------------------------------------------------------------------------
// Read handlers (polling UIs)
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct AuctionJoinRow {
    id: String,
    player_id: String,
    player_name: String,
    high_bid: i64,
    high_team_id: Option<String>,
    high_team_name: Option<String>,
    ends_at: i64,
    last_bid_at: Option<i64>,
    paused: bool,
    paused_remaining_secs: Option<i64>,
    closed_at: Option<i64>,
}

async fn get_auctions(
    State(state): State<ApiState>,
    Path(draft_id): Path<String>,
    Query(params): Query<AuctionsQuery>,
) -> Result<Json<Vec<AuctionResponse>>, AppError> {
    let limit = params.limit.unwrap_or(100);
    let now = clock::now_secs();

    let rows: Vec<AuctionJoinRow> = sqlx::query_as(
        "SELECT a.id, a.player_id, p.name AS player_name, a.high_bid, a.high_team_id, \
                t.name AS high_team_name, a.ends_at, a.last_bid_at, a.paused, \
                a.paused_remaining_secs, a.closed_at \
         FROM auctions a \
         JOIN players p ON p.id = a.player_id \
         LEFT JOIN teams t ON t.id = a.high_team_id \
         WHERE a.draft_id = ? AND (a.closed_at IS NULL OR ?) \
         ORDER BY a.created_at DESC \
         LIMIT ?",
    )
    .bind(&draft_id)
    .bind(params.include_closed)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let auctions = rows
        .into_iter()
        .map(|r| {
            let seconds_remaining = if r.paused {
                r.paused_remaining_secs.unwrap_or(0)
            } else if r.closed_at.is_some() {
                0
            } else {
                (r.ends_at - now).max(0)
            };
            AuctionResponse {
                id: r.id,
                player_id: r.player_id,
                player_name: r.player_name,
                high_bid: r.high_bid,
                high_team_id: r.high_team_id,
                high_team_name: r.high_team_name,
                ends_at: r.ends_at,
                last_bid_at: r.last_bid_at,
                paused: r.paused,
                seconds_remaining,
                closed_at: r.closed_at,
            }
        })
        .collect();

    Ok(Json(auctions))
}

#[derive(sqlx::FromRow)]
struct TeamJoinRow {
    id: String,
    name: String,
    budget_total: i64,
    budget_remaining: i64,
    roster_spots_total: i64,
    roster_spots_remaining: i64,
    committed: i64,
}

async fn get_teams(
    State(state): State<ApiState>,
    Path(draft_id): Path<String>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    // Committed totals come from the live open-auction set, same rule the
    // ledger applies on every bid. join_code never leaves the server.
    let rows: Vec<TeamJoinRow> = sqlx::query_as(
        "SELECT t.id, t.name, t.budget_total, t.budget_remaining, \
                t.roster_spots_total, t.roster_spots_remaining, \
                COALESCE(SUM(a.high_bid), 0) AS committed \
         FROM teams t \
         LEFT JOIN auctions a ON a.high_team_id = t.id AND a.closed_at IS NULL \
         WHERE t.draft_id = ? \
         GROUP BY t.id \
         ORDER BY t.name",
    )
    .bind(&draft_id)
    .fetch_all(&state.pool)
    .await?;

    let teams = rows
        .into_iter()
        .map(|r| TeamResponse {
            available: (r.budget_remaining - r.committed).max(0),
            id: r.id,
            name: r.name,
            budget_total: r.budget_total,
            budget_remaining: r.budget_remaining,
            roster_spots_total: r.roster_spots_total,
            roster_spots_remaining: r.roster_spots_remaining,
            committed: r.committed,
        })
        .collect();

    Ok(Json(teams))
}

async fn get_players(
    State(state): State<ApiState>,
    Path(draft_id): Path<String>,
    Query(params): Query<PlayersQuery>,
) -> Result<Json<Vec<PlayerResponse>>, AppError> {
    let rows: Vec<crate::db::models::PlayerRow> = sqlx::query_as(
        "SELECT * FROM players \
         WHERE draft_id = ? AND (NOT ? OR drafted_by_team_id IS NULL) \
         ORDER BY name",
    )
    .bind(&draft_id)
    .bind(params.undrafted)
    .fetch_all(&state.pool)
    .await?;

    let players = rows
        .into_iter()
        .map(|r| PlayerResponse {
            id: r.id,
            name: r.name,
            position_primary: r.position_primary,
            position_secondary: r.position_secondary,
            drafted_by_team_id: r.drafted_by_team_id,
            winning_bid: r.winning_bid,
        })
        .collect();

    Ok(Json(players))
}

async fn get_events(
    State(state): State<ApiState>,
    Path(draft_id): Path<String>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let limit = params.limit.unwrap_or(100);
    let rows: Vec<crate::db::models::EventRow> = sqlx::query_as(
        "SELECT * FROM draft_events WHERE draft_id = ? ORDER BY id DESC LIMIT ?",
    )
    .bind(&draft_id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let events = rows
        .into_iter()
        .map(|r| EventResponse {
            id: r.id,
            event_type: r.event_type,
            payload: serde_json::from_str(&r.payload)
                .unwrap_or(serde_json::Value::Null),
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(events))
}

async fn get_health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "last_sweep_at": state.health.last_sweep_at(),
        "auctions_finalized": state.health.auctions_finalized(),
        "last_quiet_tick_at": state.health.last_quiet_tick_at(),
    }))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let (p50, p95, p99) = state.latency.percentiles();
    Json(serde_json::json!({
        "samples": state.latency.len(),
        "p50_us": p50,
        "p95_us": p95,
        "p99_us": p99,
    }))
}
