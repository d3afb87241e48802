use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Alias;
use sea_orm::*;
use tracing::instrument;

use crate::entity::event_participant;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::ParticipantResponse;
use crate::models::leaderboard::*;
use crate::realtime::hub::event_room;
use crate::state::AppState;
use crate::utils::event::{find_event, find_event_for_update, require_event_owner};

#[utoipa::path(
    get,
    path = "/event/{event_id}",
    tag = "Leaderboard",
    operation_id = "getEventLeaderboard",
    summary = "Scoreboard for one event",
    description = "Participants ranked by score, highest first. Ties are broken by registration time. Public.",
    params(("event_id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Ranked participants", body = Vec<LeaderboardEntry>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(event_id))]
pub async fn event_leaderboard(
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    find_event(&state.db, event_id).await?;

    let rows = event_participant::Entity::find()
        .filter(event_participant::Column::EventId.eq(event_id))
        .order_by_desc(event_participant::Column::Score)
        .order_by_asc(event_participant::Column::RegisteredAt)
        .all(&state.db)
        .await?;

    let entries = rows
        .into_iter()
        .enumerate()
        .map(|(i, m)| LeaderboardEntry {
            rank: i as u64 + 1,
            user_id: m.user_id,
            name: m.name,
            college: m.college,
            score: m.score,
        })
        .collect();

    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/top",
    tag = "Leaderboard",
    operation_id = "getTopPerformers",
    summary = "Top performers across all events",
    description = "Users ranked by their summed score over every event they are registered for. Public.",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Top performers, highest total first", body = Vec<TopPerformer>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn top_performers(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<TopPerformer>>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let rows = event_participant::Entity::find()
        .select_only()
        .column(event_participant::Column::UserId)
        .column_as(event_participant::Column::Name.max(), "name")
        .column_as(event_participant::Column::College.max(), "college")
        .column_as(event_participant::Column::Score.sum(), "total_score")
        .column_as(event_participant::Column::EventId.count(), "events")
        .group_by(event_participant::Column::UserId)
        .order_by(Expr::col(Alias::new("total_score")), Order::Desc)
        .limit(Some(limit))
        .into_model::<TopPerformer>()
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/colleges",
    tag = "Leaderboard",
    operation_id = "getCollegeLeaderboard",
    summary = "College standings across all events",
    description = "Colleges ranked by the summed score of their participants. Public.",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "College standings, highest total first", body = Vec<CollegeStanding>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn college_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<CollegeStanding>>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let rows = event_participant::Entity::find()
        .select_only()
        .column(event_participant::Column::College)
        .column_as(event_participant::Column::Score.sum(), "total_score")
        .column_as(event_participant::Column::UserId.count(), "participants")
        .group_by(event_participant::Column::College)
        .order_by(Expr::col(Alias::new("total_score")), Order::Desc)
        .limit(Some(limit))
        .into_model::<CollegeStanding>()
        .all(&state.db)
        .await?;

    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/event/{event_id}/user/{user_id}",
    tag = "Leaderboard",
    operation_id = "getParticipantScore",
    summary = "One participant's ledger entry with score",
    params(
        ("event_id" = i32, Path, description = "Event ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Participant entry", body = ParticipantResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event or participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(event_id, user_id))]
pub async fn participant_score(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(i32, i32)>,
) -> Result<Json<ParticipantResponse>, AppError> {
    find_event(&state.db, event_id).await?;

    let row = event_participant::Entity::find_by_id((event_id, user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;

    Ok(Json(ParticipantResponse::from(row)))
}

#[utoipa::path(
    put,
    path = "/event/{event_id}/user/{user_id}",
    tag = "Leaderboard",
    operation_id = "updateParticipantScore",
    summary = "Set a participant's score",
    description = "Only the event owner or holders of `event:manage` may score. The new standing fans out to the event's room.",
    params(
        ("event_id" = i32, Path, description = "Event ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = ParticipantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id))]
pub async fn update_participant_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateScoreRequest>,
) -> Result<Json<ParticipantResponse>, AppError> {
    validate_update_score(&payload)?;

    let txn = state.db.begin().await?;
    let event_model = find_event_for_update(&txn, event_id).await?;
    require_event_owner(&auth_user, &event_model)?;

    let row = event_participant::Entity::find_by_id((event_id, user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".into()))?;

    let mut active: event_participant::ActiveModel = row.into();
    active.score = Set(payload.score);
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let notification = serde_json::json!({
        "eventId": updated.event_id,
        "userId": updated.user_id,
        "name": updated.name,
        "score": updated.score,
    });
    state
        .hub
        .emit_to_room(&event_room(event_id), "scoreUpdated", notification);

    Ok(Json(ParticipantResponse::from(updated)))
}
