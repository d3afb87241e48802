use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateScoreRequest {
    /// New absolute score for the participant; must be >= 0.
    pub score: i32,
}

pub fn validate_update_score(payload: &UpdateScoreRequest) -> Result<(), AppError> {
    if payload.score < 0 {
        return Err(AppError::Validation("Score must not be negative".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct LeaderboardQuery {
    /// Maximum number of entries to return; defaults to 10, capped at 100.
    pub limit: Option<u64>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardEntry {
    /// 1-based position; ties are broken by registration time.
    pub rank: u64,
    pub user_id: i32,
    pub name: String,
    pub college: String,
    pub score: i32,
}

/// Per-user standing aggregated across every event the user scored in.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct TopPerformer {
    pub user_id: i32,
    pub name: String,
    pub college: String,
    pub total_score: i64,
    /// Number of events the user is registered for.
    pub events: i64,
}

/// Per-college standing aggregated across all events.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct CollegeStanding {
    pub college: String,
    pub total_score: i64,
    /// Number of ledger entries contributing to the total.
    pub participants: i64,
}
