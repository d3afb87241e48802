use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{announcement, event, event_participant, system_settings, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::models::shared::{Pagination, escape_like};
use crate::registration::{self, ParticipantEntry};
use crate::state::AppState;
use crate::utils::event::{find_event, find_event_for_update, require_event_owner};

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create a new event",
    description = "Creates a new event owned by the caller. Requires `event:create` permission. The per-user event limit from system settings applies.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("event:create")?;
    validate_create_event(&payload)?;

    let settings = load_settings(&state.db).await?;
    if payload.capacity > settings.max_participants_per_event {
        return Err(AppError::Validation(format!(
            "Capacity must not exceed {}",
            settings.max_participants_per_event
        )));
    }

    let owned = event::Entity::find()
        .filter(event::Column::CreatedBy.eq(auth_user.user_id))
        .count(&state.db)
        .await?;
    if owned >= settings.max_events_per_user as u64 && !auth_user.has_permission("event:manage") {
        return Err(AppError::Validation(format!(
            "You can create at most {} events",
            settings.max_events_per_user
        )));
    }

    let now = chrono::Utc::now();
    let new_event = event::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        location: Set(payload.location.trim().to_string()),
        start_time: Set(payload.start_time),
        capacity: Set(payload.capacity),
        price: Set(payload.price),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_event.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from_model(model, 0))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events with pagination and search",
    description = "Returns a paginated list of events with optional title search. Supports sorting by `created_at`, `start_time`, or `title`.",
    params(EventListQuery),
    responses(
        (status = 200, description = "List of events", body = EventListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_events(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = event::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(event::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let sort_by = query.sort_by.as_deref().unwrap_or("start_time");
    let sort_order = if query.sort_order.as_deref() == Some("desc") {
        Order::Desc
    } else {
        Order::Asc
    };
    let sort_column = match sort_by {
        "created_at" => event::Column::CreatedAt,
        "start_time" => event::Column::StartTime,
        "title" => event::Column::Title,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, start_time, title".into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .order_by(sort_column, sort_order)
        .select_only()
        .column(event::Column::Id)
        .column(event::Column::Title)
        .column(event::Column::Location)
        .column(event::Column::StartTime)
        .column(event::Column::Capacity)
        .column(event::Column::Price)
        .column(event::Column::CreatedBy)
        .column(event::Column::CreatedAt)
        .column(event::Column::UpdatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .into_model::<EventListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(EventListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_event(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    let count = participant_count(&state.db, id).await?;
    Ok(Json(EventResponse::from_model(model, count)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "Partially updates an event. Only the owner or holders of `event:manage` may edit. Capacity cannot be reduced below the current participant count.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    validate_update_event(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    require_event_owner(&auth_user, &existing)?;

    let count = participant_count(&txn, id).await?;
    if let Some(capacity) = payload.capacity
        && (capacity as u64) < count
    {
        return Err(AppError::Validation(format!(
            "Capacity cannot be reduced below the current participant count ({count})"
        )));
    }

    let mut active: event::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(ref location) = payload.location {
        active.location = Set(location.trim().to_string());
    }
    if let Some(start_time) = payload.start_time {
        active.start_time = Set(start_time);
    }
    if let Some(capacity) = payload.capacity {
        active.capacity = Set(capacity);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(EventResponse::from_model(model, count)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Deletes an event with its participant list and announcements. Only the owner or holders of `event:manage` may delete.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    require_event_owner(&auth_user, &existing)?;

    event_participant::Entity::delete_many()
        .filter(event_participant::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    announcement::Entity::delete_many()
        .filter(announcement::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/participants",
    tag = "Events",
    operation_id = "listParticipants",
    summary = "List an event's participants",
    description = "Returns the event's registration ledger, ordered by registration time.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "List of participants", body = Vec<ParticipantResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn list_participants(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ParticipantResponse>>, AppError> {
    find_event(&state.db, id).await?;

    let rows = event_participant::Entity::find()
        .filter(event_participant::Column::EventId.eq(id))
        .order_by_asc(event_participant::Column::RegisteredAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(ParticipantResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/register",
    tag = "Events",
    operation_id = "registerForEvent",
    summary = "Self-register for a free event",
    description = "Registers the authenticated user for a free event. Paid events must go through the payment flow. Blocked once the event has started or while registration is disabled in system settings.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 201, description = "Registered", body = ParticipantResponse),
        (status = 400, description = "Paid event, started event, or registration disabled (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already registered or event full (ALREADY_REGISTERED, EVENT_FULL)", body = ErrorBody),
        (status = 503, description = "Maintenance mode (MAINTENANCE_MODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn register_for_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let settings = load_settings(&state.db).await?;
    if settings.maintenance_mode {
        return Err(AppError::Maintenance);
    }
    if !settings.registration_enabled {
        return Err(AppError::Validation(
            "Event registration is currently disabled".into(),
        ));
    }

    let caller = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let txn = state.db.begin().await?;
    let event_model = find_event_for_update(&txn, id).await?;

    if event_model.price > 0 {
        return Err(AppError::Validation(
            "This is a paid event; registration happens through the payment flow".into(),
        ));
    }
    if chrono::Utc::now() >= event_model.start_time {
        return Err(AppError::Validation("Event has already started".into()));
    }

    let entry = ParticipantEntry {
        user_id: caller.id,
        name: caller.display_name(),
        email: caller.email,
        college: caller.college,
    };
    let row = registration::register(&txn, id, entry).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(ParticipantResponse::from(row))))
}

#[utoipa::path(
    delete,
    path = "/{id}/register",
    tag = "Events",
    operation_id = "unregisterFromEvent",
    summary = "Cancel the caller's registration",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Registration cancelled"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not registered or event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn unregister_from_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    registration::cancel(&txn, id, auth_user.user_id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn participant_count<C: ConnectionTrait>(db: &C, event_id: i32) -> Result<u64, AppError> {
    Ok(event_participant::Entity::find()
        .filter(event_participant::Column::EventId.eq(event_id))
        .count(db)
        .await?)
}

pub async fn load_settings<C: ConnectionTrait>(
    db: &C,
) -> Result<system_settings::Model, AppError> {
    system_settings::Entity::find_by_id(system_settings::SINGLETON_ID)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal("System settings row missing".into()))
}
