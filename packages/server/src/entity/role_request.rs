use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub mod status {
    pub const PENDING: &str = "pending";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

/// The only role that can currently be requested.
pub const REQUESTABLE_ROLE: &str = "organizer";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    // Snapshot of the requester, shown on the admin review screen.
    pub name: String,
    pub email: String,
    pub college: String,
    pub message: String,

    pub requested_role: String,

    /// One of: pending, approved, rejected. Terminal once decided.
    pub status: String,

    pub created_at: DateTimeUtc,
    pub handled_by: Option<i32>,
    pub handled_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
