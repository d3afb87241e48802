use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{system_settings, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::event::load_settings;
use crate::models::admin::*;
use crate::models::shared::escape_like;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List users with optional search",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users, newest first", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require_permission("user:manage")?;

    let mut select = user::Entity::find();
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            let matches = |col: user::Column| {
                Expr::expr(Func::lower(Expr::col(col)))
                    .like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            select = select.filter(
                Condition::any()
                    .add(matches(user::Column::FirstName))
                    .add(matches(user::Column::LastName))
                    .add(matches(user::Column::Email))
                    .add(matches(user::Column::College)),
            );
        }
    }

    let rows = select
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "getUser",
    summary = "Get a user by ID",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_permission("user:manage")?;

    let model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Json(UserResponse::from(model)))
}

#[utoipa::path(
    put,
    path = "/users/{id}/role",
    tag = "Admin",
    operation_id = "updateUserRole",
    summary = "Change a user's role",
    description = "Requires `user:manage`. Admins cannot change their own role, so there is always another admin left to undo a mistake.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Unknown role or own account (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_permission("user:manage")?;
    validate_role(&payload.role)?;

    if id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot change your own role".into(),
        ));
    }

    let model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut active: user::ActiveModel = model.into();
    active.role = Set(payload.role);
    let updated = active.update(&state.db).await?;

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/settings",
    tag = "Admin",
    operation_id = "getSettings",
    summary = "Read system settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    auth_user.require_permission("settings:manage")?;
    let settings = load_settings(&state.db).await?;
    Ok(Json(SettingsResponse::from(settings)))
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "Admin",
    operation_id = "updateSettings",
    summary = "Update system settings",
    description = "Partial update of the singleton settings row. Requires `settings:manage`.",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = SettingsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_settings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    auth_user.require_permission("settings:manage")?;
    validate_update_settings(&payload)?;

    let settings = load_settings(&state.db).await?;
    let mut active: system_settings::ActiveModel = settings.into();
    if let Some(site_name) = payload.site_name {
        active.site_name = Set(site_name.trim().to_string());
    }
    if let Some(site_description) = payload.site_description {
        active.site_description = Set(site_description);
    }
    if let Some(contact_email) = payload.contact_email {
        active.contact_email = Set(contact_email.trim().to_lowercase());
    }
    if let Some(maintenance_mode) = payload.maintenance_mode {
        active.maintenance_mode = Set(maintenance_mode);
    }
    if let Some(registration_enabled) = payload.registration_enabled {
        active.registration_enabled = Set(registration_enabled);
    }
    if let Some(max_events_per_user) = payload.max_events_per_user {
        active.max_events_per_user = Set(max_events_per_user);
    }
    if let Some(max_participants_per_event) = payload.max_participants_per_event {
        active.max_participants_per_event = Set(max_participants_per_event);
    }
    if let Some(minutes) = payload.default_event_duration_minutes {
        active.default_event_duration_minutes = Set(minutes);
    }
    active.updated_by = Set(Some(auth_user.user_id));
    active.updated_at = Set(chrono::Utc::now());

    let updated = active.update(&state.db).await?;
    Ok(Json(SettingsResponse::from(updated)))
}
