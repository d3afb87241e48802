use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the singleton settings row.
pub const SINGLETON_ID: i32 = 1;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    pub site_name: String,
    pub site_description: String,
    pub contact_email: String,

    pub maintenance_mode: bool,
    pub registration_enabled: bool,

    pub max_events_per_user: i32,
    pub max_participants_per_event: i32,
    /// Default duration for new events, in minutes.
    pub default_event_duration_minutes: i32,

    pub updated_by: Option<i32>,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
