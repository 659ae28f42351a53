use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbBackend, DbErr, EntityTrait, QueryFilter, Schema, Set,
};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{DatabaseConfig, SeedConfig};
use crate::entity::{expense, function, group, group_label, guest, invite, label, rsvp, user};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    info!("Connecting to database: {}", config.redacted_url());

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create all tables and indexes that do not exist yet
pub async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    // Create tables in dependency order
    // 1. Independent tables first
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(group::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(label::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(function::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(expense::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;

    // 2. Tables with foreign key dependencies
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(guest::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(group_label::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(invite::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(rsvp::Entity)).await?;

    // 3. Composite unique keys
    create_index_if_not_exists(
        db,
        backend,
        Index::create()
            .name("idx_group_label_pair")
            .table(group_label::Entity)
            .col(group_label::Column::GroupId)
            .col(group_label::Column::LabelId)
            .unique()
            .to_owned(),
    )
    .await?;
    create_index_if_not_exists(
        db,
        backend,
        Index::create()
            .name("idx_invite_guest_function")
            .table(invite::Entity)
            .col(invite::Column::GuestId)
            .col(invite::Column::FunctionId)
            .unique()
            .to_owned(),
    )
    .await?;
    create_index_if_not_exists(
        db,
        backend,
        Index::create()
            .name("idx_rsvp_guest_function")
            .table(rsvp::Entity)
            .col(rsvp::Column::GuestId)
            .col(rsvp::Column::FunctionId)
            .unique()
            .to_owned(),
    )
    .await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Create an index if it doesn't exist
async fn create_index_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: IndexCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Insert predefined groups and default users that are missing
pub async fn seed(db: &DatabaseConnection, config: &SeedConfig) -> Result<(), DbErr> {
    for name in &config.groups {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let existing = group::Entity::find()
            .filter(group::Column::NameKey.eq(crate::validate::name_key(name)))
            .one(db)
            .await?;

        match existing {
            Some(g) if g.is_predefined => {}
            Some(g) => {
                let mut active: group::ActiveModel = g.into();
                active.is_predefined = Set(true);
                active.update(db).await?;
            }
            None => {
                group::ActiveModel {
                    name: Set(name.to_string()),
                    name_key: Set(crate::validate::name_key(name)),
                    is_predefined: Set(true),
                    ..Default::default()
                }
                .insert(db)
                .await?;
                info!("Seeded predefined group: {}", name);
            }
        }
    }

    for seed_user in &config.users {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(&seed_user.email))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let hashed = match bcrypt::hash(&seed_user.password, bcrypt::DEFAULT_COST) {
            Ok(h) => h,
            Err(e) => {
                warn!("Failed to hash password for {}: {}", seed_user.email, e);
                continue;
            }
        };

        user::ActiveModel {
            email: Set(seed_user.email.clone()),
            password: Set(hashed),
            role: Set(seed_user.role.clone()),
            name: Set(seed_user.name.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Seeded user: {}", seed_user.email);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedUser;

    async fn memory_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        auto_migrate(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_auto_migrate_is_idempotent() {
        let db = memory_db().await;
        auto_migrate(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_seed_groups_and_users() {
        let db = memory_db().await;
        group::ActiveModel {
            name: Set("Zahra".to_string()),
            name_key: Set("zahra".to_string()),
            is_predefined: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let config = SeedConfig {
            groups: vec!["zahra".to_string(), "khozema".to_string(), " ".to_string()],
            users: vec![SeedUser {
                email: "bride@wedding.com".to_string(),
                password: "password123".to_string(),
                role: "bride".to_string(),
                name: "Bride".to_string(),
            }],
        };
        seed(&db, &config).await.unwrap();
        seed(&db, &config).await.unwrap();

        let groups = group::Entity::find().all(&db).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.is_predefined));

        let users = user::Entity::find().all(&db).await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(bcrypt::verify("password123", &users[0].password).unwrap());
    }
}
