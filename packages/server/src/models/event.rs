use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_title};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_time: DateTime<Utc>,
    /// Maximum number of participants; must be >= 1.
    pub capacity: i32,
    /// Ticket price in whole currency units; 0 for free events.
    pub price: i64,
}

pub fn validate_create_event(payload: &CreateEventRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    if payload.capacity < 1 {
        return Err(AppError::Validation("Capacity must be at least 1".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("Price must not be negative".into()));
    }
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub price: Option<i64>,
}

pub fn validate_update_event(payload: &UpdateEventRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(capacity) = payload.capacity
        && capacity < 1
    {
        return Err(AppError::Validation("Capacity must be at least 1".into()));
    }
    if let Some(price) = payload.price
        && price < 0
    {
        return Err(AppError::Validation("Price must not be negative".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub capacity: i32,
    pub price: i64,
    pub created_by: i32,
    /// Current number of ledger entries.
    pub participant_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn from_model(m: crate::entity::event::Model, participant_count: u64) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            location: m.location,
            start_time: m.start_time,
            capacity: m.capacity,
            price: m.price,
            created_by: m.created_by,
            participant_count,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct EventListItem {
    pub id: i32,
    pub title: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub capacity: i32,
    pub price: i64,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventListItem>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipantResponse {
    pub event_id: i32,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub college: String,
    pub score: i32,
    pub registered_at: DateTime<Utc>,
}

impl From<crate::entity::event_participant::Model> for ParticipantResponse {
    fn from(m: crate::entity::event_participant::Model) -> Self {
        Self {
            event_id: m.event_id,
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            college: m.college,
            score: m.score,
            registered_at: m.registered_at,
        }
    }
}
