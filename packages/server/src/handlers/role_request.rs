use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, role_request, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::event::load_settings;
use crate::models::admin::*;
use crate::realtime::hub::role_room;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/role-request",
    tag = "Auth",
    operation_id = "createRoleRequest",
    summary = "Request promotion to organizer",
    description = "Opens a pending organizer request for review. Only one pending request per user; a new request is allowed once the previous one has been decided.",
    request_body = CreateRoleRequestRequest,
    responses(
        (status = 201, description = "Request created", body = RoleRequestResponse),
        (status = 400, description = "Caller already holds the role (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "A pending request already exists (DUPLICATE_PENDING)", body = ErrorBody),
        (status = 503, description = "Maintenance mode (MAINTENANCE_MODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn create_role_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRoleRequestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings = load_settings(&state.db).await?;
    if settings.maintenance_mode {
        return Err(AppError::Maintenance);
    }

    if auth_user.role != role::DEFAULT_ROLE {
        return Err(AppError::Validation(format!(
            "Only {} accounts can request the {} role",
            role::DEFAULT_ROLE,
            role_request::REQUESTABLE_ROLE
        )));
    }

    let caller = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let pending = role_request::Entity::find()
        .filter(role_request::Column::UserId.eq(auth_user.user_id))
        .filter(role_request::Column::Status.eq(role_request::status::PENDING))
        .one(&state.db)
        .await?;
    if pending.is_some() {
        return Err(AppError::DuplicatePending);
    }

    let new_request = role_request::ActiveModel {
        user_id: Set(caller.id),
        name: Set(caller.display_name()),
        email: Set(caller.email),
        college: Set(caller.college),
        message: Set(payload.message.trim().to_string()),
        requested_role: Set(role_request::REQUESTABLE_ROLE.to_string()),
        status: Set(role_request::status::PENDING.to_string()),
        created_at: Set(chrono::Utc::now()),
        handled_by: Set(None),
        handled_at: Set(None),
        ..Default::default()
    };

    // The partial unique index on pending requests backstops the check above
    // when two requests race past it.
    let model = match new_request.insert(&state.db).await {
        Ok(model) => model,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::DuplicatePending);
        }
        Err(e) => return Err(e.into()),
    };

    // Admin dashboards sit in the admin role room; the global emit keeps
    // clients that never joined a room in the loop.
    let notification = serde_json::json!({
        "id": model.id,
        "name": model.name,
        "requestedRole": model.requested_role,
    });
    state.hub.emit_to_room(
        &role_room(role::ADMIN_ROLE),
        "roleRequestCreated",
        notification.clone(),
    );
    state.hub.emit_to_all("roleRequestCreated", notification);

    Ok((StatusCode::CREATED, Json(RoleRequestResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/role-requests",
    tag = "Auth",
    operation_id = "listMyRoleRequests",
    summary = "List the caller's role requests",
    responses(
        (status = 200, description = "Requests, newest first", body = Vec<RoleRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn my_role_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleRequestResponse>>, AppError> {
    let rows = role_request::Entity::find()
        .filter(role_request::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(role_request::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(RoleRequestResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/role-requests",
    tag = "Admin",
    operation_id = "listRoleRequests",
    summary = "List role requests for review",
    description = "Requires `role_request:manage`. Pending requests double as the review badge count.",
    params(RoleRequestListQuery),
    responses(
        (status = 200, description = "Requests, oldest pending first", body = Vec<RoleRequestResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_role_requests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RoleRequestListQuery>,
) -> Result<Json<Vec<RoleRequestResponse>>, AppError> {
    auth_user.require_permission("role_request:manage")?;

    let mut select = role_request::Entity::find();
    if let Some(ref status) = query.status {
        let valid = [
            role_request::status::PENDING,
            role_request::status::APPROVED,
            role_request::status::REJECTED,
        ];
        if !valid.contains(&status.as_str()) {
            return Err(AppError::Validation(
                "Status must be one of: pending, approved, rejected".into(),
            ));
        }
        select = select.filter(role_request::Column::Status.eq(status.as_str()));
    }

    let rows = select
        .order_by_asc(role_request::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(RoleRequestResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/role-requests/{id}",
    tag = "Admin",
    operation_id = "decideRoleRequest",
    summary = "Approve or reject a role request",
    description = "Requires `role_request:manage`. Approval promotes the requester in the same transaction as the decision; a decided request is terminal.",
    params(("id" = i32, Path, description = "Role request ID")),
    request_body = DecideRoleRequestRequest,
    responses(
        (status = 200, description = "Request decided", body = RoleRequestResponse),
        (status = 400, description = "Invalid outcome (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Request not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already decided (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn decide_role_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<DecideRoleRequestRequest>,
) -> Result<Json<RoleRequestResponse>, AppError> {
    auth_user.require_permission("role_request:manage")?;

    let outcome = payload.status.as_str();
    if outcome != role_request::status::APPROVED && outcome != role_request::status::REJECTED {
        return Err(AppError::Validation(
            "Status must be either approved or rejected".into(),
        ));
    }

    // The decision and the role promotion must land together or not at all.
    let txn = state.db.begin().await?;
    let request = role_request::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Role request not found".into()))?;

    if request.status != role_request::status::PENDING {
        return Err(AppError::Conflict(format!(
            "Role request already {}",
            request.status
        )));
    }

    if outcome == role_request::status::APPROVED {
        let requester = user::Entity::find_by_id(request.user_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Requesting user not found".into()))?;
        let mut active: user::ActiveModel = requester.into();
        active.role = Set(request.requested_role.clone());
        active.update(&txn).await?;
    }

    let mut active: role_request::ActiveModel = request.into();
    active.status = Set(outcome.to_string());
    active.handled_by = Set(Some(auth_user.user_id));
    active.handled_at = Set(Some(chrono::Utc::now()));
    let decided = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(RoleRequestResponse::from(decided)))
}
