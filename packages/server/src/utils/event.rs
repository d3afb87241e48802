use sea_orm::{ConnectionTrait, DatabaseTransaction, EntityTrait};

use crate::entity::event;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an event and lock its row for the duration of the transaction.
///
/// Every capacity or duplicate check against the participant list must hold
/// this lock, otherwise two concurrent registrations can both pass the check
/// for the last open slot.
pub async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    use sea_orm::QuerySelect;
    use sea_orm::sea_query::LockType;
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Events are owned by their creator for edit/delete; `event:manage` overrides.
pub fn require_event_owner(auth_user: &AuthUser, event: &event::Model) -> Result<(), AppError> {
    if event.created_by == auth_user.user_id || auth_user.has_permission("event:manage") {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}
