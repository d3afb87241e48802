use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{payment, role, role_permission, role_request, system_settings};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &[role::DEFAULT_ROLE, role::ORGANIZER_ROLE, role::ADMIN_ROLE];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "event:create"),
    ("admin", "event:manage"),
    ("admin", "user:manage"),
    ("admin", "role_request:manage"),
    ("admin", "settings:manage"),
    ("admin", "announcement:create"),
    ("admin", "announcement:manage"),
    // Organizer
    ("organizer", "event:create"),
    ("organizer", "announcement:create"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Seed roles
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    // Seed role-permission mappings
    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Seed the singleton `system_settings` row with defaults, if absent.
pub async fn seed_system_settings(db: &DatabaseConnection) -> Result<(), DbErr> {
    let model = system_settings::ActiveModel {
        id: Set(system_settings::SINGLETON_ID),
        site_name: Set("Coordinet".to_string()),
        site_description: Set("Campus event coordination platform".to_string()),
        contact_email: Set("contact@coordinet.local".to_string()),
        maintenance_mode: Set(false),
        registration_enabled: Set(true),
        max_events_per_user: Set(10),
        max_participants_per_event: Set(1000),
        default_event_duration_minutes: Set(120),
        updated_by: Set(None),
        updated_at: Set(chrono::Utc::now()),
    };

    let result = system_settings::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(system_settings::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => {
            info!("Seeded system settings defaults");
            Ok(())
        }
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Webhook and confirm both resolve payments by provider intent id:
    // SELECT * FROM payment WHERE provider_intent_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_payment_provider_intent")
        .table(payment::Entity)
        .col(payment::Column::ProviderIntentId)
        .to_string(PostgresQueryBuilder);

    let result = db.execute_unprepared(&stmt).await;
    match result {
        Ok(_) => {
            info!("Ensured index idx_payment_provider_intent exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_payment_provider_intent: {}", e);
        }
    }

    // Duplicate-pending check:
    // SELECT * FROM role_request WHERE user_id = ? AND status = 'pending'
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_role_request_user_status")
        .table(role_request::Entity)
        .col(role_request::Column::UserId)
        .col(role_request::Column::Status)
        .to_string(PostgresQueryBuilder);

    let result = db.execute_unprepared(&stmt).await;
    match result {
        Ok(_) => {
            info!("Ensured index idx_role_request_user_status exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_role_request_user_status: {}", e);
        }
    }

    // One pending request per user, enforced at the store level. sea-query's
    // index builder has no partial-index support, so raw SQL.
    let stmt = "CREATE UNIQUE INDEX IF NOT EXISTS uniq_role_request_pending \
                ON role_request (user_id) WHERE status = 'pending'";
    let result = db.execute_unprepared(stmt).await;
    match result {
        Ok(_) => {
            info!("Ensured index uniq_role_request_pending exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index uniq_role_request_pending: {}", e);
        }
    }

    Ok(())
}
