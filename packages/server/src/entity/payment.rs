use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment statuses. `pending` transitions to exactly one of the terminal
/// states and terminal states are never overwritten.
pub mod status {
    pub const PENDING: &str = "pending";
    pub const SUCCEEDED: &str = "succeeded";
    pub const FAILED: &str = "failed";
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub event_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub quantity: i32,

    /// Provider-side intent id; set once the provider call succeeds.
    pub provider_intent_id: Option<String>,
    pub receipt_url: Option<String>,

    /// Registration form data captured at intent creation, replayed into the
    /// ledger entry on settlement.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub registration_data: Option<serde_json::Value>,

    /// One of: pending, succeeded, failed.
    pub status: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
