use crate::entities::prelude::*;
use crate::services::tier_service::TierService;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tracing::info;

/// Thumbnail heights registered on a fresh database.
pub const DEFAULT_THUMBNAIL_SIZES: [i32; 2] = [200, 400];

/// Built-in tiers: (name, thumbnail heights, can_create_link)
pub const BUILTIN_TIERS: [(&str, &[i32], bool); 3] = [
    ("Basic", &[200], false),
    ("Premium", &[200, 400], false),
    ("Enterprise", &[200, 400], true),
];

/// Creates the built-in tiers unless any tier already exists, so edits made
/// with the `manage` tool survive restarts.
pub async fn seed_default_tiers(db: &DatabaseConnection) -> anyhow::Result<()> {
    if Tiers::find().count(db).await? > 0 {
        return Ok(());
    }

    info!("🌱 Seeding default tiers...");

    for size in DEFAULT_THUMBNAIL_SIZES {
        TierService::create_thumbnail(db, size).await?;
    }

    for (name, sizes, can_create_link) in BUILTIN_TIERS {
        TierService::create_tier(db, name, sizes, can_create_link).await?;
    }

    info!("✅ Seeded {} tiers", BUILTIN_TIERS.len());
    Ok(())
}
