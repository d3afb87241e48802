use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub college: String,

    /// One of: participant, organizer, admin.
    pub role: String,

    #[sea_orm(has_many, via = "event_participant")]
    pub events: HasMany<super::event::Entity>,

    #[sea_orm(has_many)]
    pub payments: HasMany<super::payment::Entity>,

    #[sea_orm(has_many)]
    pub role_requests: HasMany<super::role_request::Entity>,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Display name used on registration ledger entries; falls back to the
    /// email when both name fields are blank.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if name.is_empty() { self.email.clone() } else { name }
    }
}

impl ActiveModelBehavior for ActiveModel {}
