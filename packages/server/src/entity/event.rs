use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String, // in Markdown
    pub location: String,
    pub start_time: DateTimeUtc,

    /// Maximum number of participants; always > 0.
    pub capacity: i32,
    /// Ticket price in whole currency units. 0 means a free event.
    pub price: i64,

    pub created_by: i32,
    #[sea_orm(belongs_to, from = "created_by", to = "id", relation_enum = "Creator")]
    pub creator: HasOne<super::user::Entity>,

    #[sea_orm(has_many, via = "event_participant")]
    pub participants: HasMany<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
