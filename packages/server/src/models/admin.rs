use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::role;
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    /// Case-insensitive match against name, email, and college.
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub college: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(u: crate::entity::user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            college: u.college,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRoleRequest {
    /// One of: participant, organizer, admin.
    pub role: String,
}

pub fn validate_role(requested: &str) -> Result<(), AppError> {
    const VALID: &[&str] = &[role::DEFAULT_ROLE, role::ORGANIZER_ROLE, role::ADMIN_ROLE];
    if VALID.contains(&requested) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Role must be one of: participant, organizer, admin".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Role requests
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateRoleRequestRequest {
    /// Free-form note to the reviewing admin.
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct DecideRoleRequestRequest {
    /// Either "approved" or "rejected".
    pub status: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RoleRequestListQuery {
    /// Filter by status (pending, approved, rejected).
    pub status: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleRequestResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub college: String,
    pub message: String,
    pub requested_role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub handled_by: Option<i32>,
    pub handled_at: Option<DateTime<Utc>>,
}

impl From<crate::entity::role_request::Model> for RoleRequestResponse {
    fn from(r: crate::entity::role_request::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            email: r.email,
            college: r.college,
            message: r.message,
            requested_role: r.requested_role,
            status: r.status,
            created_at: r.created_at,
            handled_by: r.handled_by,
            handled_at: r.handled_at,
        }
    }
}

// ---------------------------------------------------------------------------
// System settings
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct SettingsResponse {
    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,
    pub maintenance_mode: bool,
    pub registration_enabled: bool,
    pub max_events_per_user: i32,
    pub max_participants_per_event: i32,
    pub default_event_duration_minutes: i32,
    pub updated_by: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::system_settings::Model> for SettingsResponse {
    fn from(s: crate::entity::system_settings::Model) -> Self {
        Self {
            site_name: s.site_name,
            site_description: s.site_description,
            contact_email: s.contact_email,
            maintenance_mode: s.maintenance_mode,
            registration_enabled: s.registration_enabled,
            max_events_per_user: s.max_events_per_user,
            max_participants_per_event: s.max_participants_per_event,
            default_event_duration_minutes: s.default_event_duration_minutes,
            updated_by: s.updated_by,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateSettingsRequest {
    pub site_name: Option<String>,
    pub site_description: Option<String>,
    pub contact_email: Option<String>,
    pub maintenance_mode: Option<bool>,
    pub registration_enabled: Option<bool>,
    pub max_events_per_user: Option<i32>,
    pub max_participants_per_event: Option<i32>,
    pub default_event_duration_minutes: Option<i32>,
}

pub fn validate_update_settings(payload: &UpdateSettingsRequest) -> Result<(), AppError> {
    if let Some(ref email) = payload.contact_email {
        super::shared::validate_email(email)?;
    }
    for (value, name) in [
        (payload.max_events_per_user, "max_events_per_user"),
        (
            payload.max_participants_per_event,
            "max_participants_per_event",
        ),
        (
            payload.default_event_duration_minutes,
            "default_event_duration_minutes",
        ),
    ] {
        if let Some(v) = value
            && v < 1
        {
            return Err(AppError::Validation(format!("{name} must be at least 1")));
        }
    }
    Ok(())
}
