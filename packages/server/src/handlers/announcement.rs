use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::announcement;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::announcement::*;
use crate::realtime::hub::event_room;
use crate::state::AppState;
use crate::utils::event::{find_event, require_event_owner};

#[utoipa::path(
    post,
    path = "/",
    tag = "Announcements",
    operation_id = "createAnnouncement",
    summary = "Publish an announcement",
    description = "Requires `announcement:create`. Event-scoped announcements additionally require owning the event or `event:manage`, and fan out to that event's room; site-wide ones fan out to every connected client.",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement published", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("announcement:create")?;
    validate_create_announcement(&payload)?;

    if let Some(event_id) = payload.event_id {
        let event_model = find_event(&state.db, event_id).await?;
        require_event_owner(&auth_user, &event_model)?;
    }

    let model = announcement::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        body: Set(payload.body),
        event_id: Set(payload.event_id),
        created_by: Set(auth_user.user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let notification = serde_json::json!({
        "id": model.id,
        "title": model.title,
        "eventId": model.event_id,
    });
    match model.event_id {
        Some(event_id) => {
            state
                .hub
                .emit_to_room(&event_room(event_id), "announcementCreated", notification);
        }
        None => state.hub.emit_to_all("announcementCreated", notification),
    }

    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Announcements",
    operation_id = "listAnnouncements",
    summary = "List announcements",
    description = "Newest first. With `event_id`, returns that event's announcements plus site-wide ones.",
    params(AnnouncementListQuery),
    responses(
        (status = 200, description = "Announcements", body = Vec<AnnouncementResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_announcements(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AnnouncementListQuery>,
) -> Result<Json<Vec<AnnouncementResponse>>, AppError> {
    let mut select = announcement::Entity::find();
    if let Some(event_id) = query.event_id {
        select = select.filter(
            Condition::any()
                .add(announcement::Column::EventId.eq(event_id))
                .add(announcement::Column::EventId.is_null()),
        );
    }

    let rows = select
        .order_by_desc(announcement::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(AnnouncementResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Announcements",
    operation_id = "deleteAnnouncement",
    summary = "Delete an announcement",
    description = "Allowed for the author or holders of `announcement:manage`.",
    params(("id" = i32, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Announcement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let model = announcement::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Announcement not found".into()))?;

    if model.created_by != auth_user.user_id && !auth_user.has_permission("announcement:manage") {
        return Err(AppError::PermissionDenied);
    }

    let active: announcement::ActiveModel = model.into();
    active.delete(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}
