//! Registration ledger.
//!
//! All mutations of an event's participant list go through this module, from
//! self-registration as well as from payment settlement. Each operation runs
//! inside the caller's transaction and takes a `FOR UPDATE` lock on the event
//! row before checking the list, so the duplicate/capacity check and the
//! insert are a single atomic read-modify-write. The composite primary key on
//! `event_participant` is the store-level backstop against duplicates.

use sea_orm::*;

use crate::entity::{event, event_participant};
use crate::error::AppError;
use crate::utils::event::find_event_for_update;

/// A participant entry to append to an event's ledger.
pub struct ParticipantEntry {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub college: String,
}

/// Append `entry` to the event's participant list.
///
/// Fails with `AlreadyRegistered` if the user already has a ledger entry and
/// `EventFull` if the list is at capacity. The event row stays locked until
/// the caller commits.
pub async fn register(
    txn: &DatabaseTransaction,
    event_id: i32,
    entry: ParticipantEntry,
) -> Result<event_participant::Model, AppError> {
    let event_model = find_event_for_update(txn, event_id).await?;

    let existing = event_participant::Entity::find_by_id((event_id, entry.user_id))
        .one(txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::AlreadyRegistered);
    }

    let count = event_participant::Entity::find()
        .filter(event_participant::Column::EventId.eq(event_id))
        .count(txn)
        .await?;
    if count >= event_model.capacity as u64 {
        return Err(AppError::EventFull);
    }

    let new_row = event_participant::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(entry.user_id),
        name: Set(entry.name),
        email: Set(entry.email),
        college: Set(entry.college),
        score: Set(0),
        registered_at: Set(chrono::Utc::now()),
    };

    match new_row.insert(txn).await {
        Ok(model) => Ok(model),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(AppError::AlreadyRegistered)
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove the user's ledger entry, failing with 404 if none exists.
pub async fn cancel(
    txn: &DatabaseTransaction,
    event_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    find_event_for_update(txn, event_id).await?;

    let row = event_participant::Entity::find_by_id((event_id, user_id))
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Not registered for this event".into()))?;

    let active: event_participant::ActiveModel = row.into();
    active.delete(txn).await?;
    Ok(())
}
