use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registration ledger row. The composite primary key makes duplicate
/// registrations impossible at the store level.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_participant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub event_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: Option<super::event::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: Option<super::user::Entity>,

    // Denormalized at registration time so the ledger reads the way the
    // participant looked when they registered.
    pub name: String,
    pub email: String,
    pub college: String,

    /// Competition score, maintained by the event's organizer through the
    /// leaderboard endpoints. Starts at zero.
    pub score: i32,

    pub registered_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
