use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_title;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
    /// Omit for a site-wide announcement.
    pub event_id: Option<i32>,
}

pub fn validate_create_announcement(payload: &CreateAnnouncementRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    if payload.body.trim().is_empty() {
        return Err(AppError::Validation("Body must not be empty".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AnnouncementListQuery {
    /// Restrict to one event's announcements.
    pub event_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementResponse {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub event_id: Option<i32>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::announcement::Model> for AnnouncementResponse {
    fn from(a: crate::entity::announcement::Model) -> Self {
        Self {
            id: a.id,
            title: a.title,
            body: a.body,
            event_id: a.event_id,
            created_by: a.created_by,
            created_at: a.created_at,
        }
    }
}
