use crate::entities::{binary_image_links, images, thumbnails, tier_thumbnails, tiers, users};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm::{ConnectionTrait, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://images.db?mode=rwc";

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(32)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    info!("🔄 Running auto-migrations...");

    // Order matters for foreign keys: tiers before users, users before images/links
    let stmts = vec![
        (
            "tiers",
            schema
                .create_table_from_entity(tiers::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "thumbnails",
            schema
                .create_table_from_entity(thumbnails::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "tier_thumbnails",
            schema
                .create_table_from_entity(tier_thumbnails::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "users",
            schema
                .create_table_from_entity(users::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "images",
            schema
                .create_table_from_entity(images::Entity)
                .if_not_exists()
                .to_owned(),
        ),
        (
            "binary_image_links",
            schema
                .create_table_from_entity(binary_image_links::Entity)
                .if_not_exists()
                .to_owned(),
        ),
    ];

    for (name, stmt) in stmts {
        let stmt = builder.build(&stmt);
        db.execute(stmt).await?;
        info!("   - Table '{}' checked/created", name);
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_images_user_id ON images(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_binary_image_links_user_id ON binary_image_links(user_id)",
    ];

    for query in indexes {
        db.execute(sea_orm::Statement::from_string(builder, query.to_owned()))
            .await?;
    }

    Ok(())
}
