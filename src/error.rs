use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // Infrastructure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Malformed or out-of-range input. Fixed by the caller, never retried.
    #[error("{0}")]
    Validation(String),

    // Credential and lookup failures.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid team code")]
    InvalidTeamCode,

    #[error("{0} not found")]
    NotFound(&'static str),

    // State conflicts. Expected under concurrency; callers re-fetch and may
    // retry the higher-level action.
    #[error("Auction has ended")]
    AuctionEnded,

    #[error("Player is already drafted")]
    AlreadyDrafted,

    #[error("An open auction already exists for this player")]
    DuplicateAuction,

    #[error("No roster spots remaining")]
    NoRosterSpace,

    #[error("Bid must be at least {min}")]
    BidTooLow { min: i64 },

    #[error("Bid exceeds available budget ({available})")]
    InsufficientBudget { available: i64 },

    #[error("Auction has not expired yet")]
    NotExpiredYet,

    #[error("Auction changed concurrently; re-check the current high bid and retry")]
    BidConflict,

    // Invariant violation: a race slipped past the optimistic checks. The
    // finalization transaction rolls back whole and the auction stays open
    // for manual resolution.
    #[error("Winner is out of roster spots or budget; award aborted")]
    RosterOverflow,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidTeamCode => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuctionEnded
            | AppError::AlreadyDrafted
            | AppError::DuplicateAuction
            | AppError::NoRosterSpace
            | AppError::BidTooLow { .. }
            | AppError::InsufficientBudget { .. }
            | AppError::NotExpiredYet
            | AppError::BidConflict
            | AppError::RosterOverflow => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
