use crate::entities::{prelude::*, thumbnails, tier_thumbnails, tiers, users};
use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

/// A tier together with the thumbnail heights it grants, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct TierProfile {
    pub tier: tiers::Model,
    pub thumbnail_sizes: Vec<i32>,
}

impl TierProfile {
    pub fn name(&self) -> &str {
        &self.tier.name
    }

    pub fn can_create_link(&self) -> bool {
        self.tier.can_create_link
    }
}

pub struct TierService;

impl TierService {
    pub async fn load_profile<C: ConnectionTrait>(
        db: &C,
        tier_id: i32,
    ) -> Result<Option<TierProfile>, DbErr> {
        let Some(tier) = Tiers::find_by_id(tier_id).one(db).await? else {
            return Ok(None);
        };

        let mut thumbnail_sizes: Vec<i32> = tier
            .find_related(Thumbnails)
            .order_by_asc(thumbnails::Column::Value)
            .all(db)
            .await?
            .into_iter()
            .map(|t| t.value)
            .collect();
        thumbnail_sizes.dedup();

        Ok(Some(TierProfile {
            tier,
            thumbnail_sizes,
        }))
    }

    /// Returns the existing row when `value` is already registered.
    pub async fn create_thumbnail<C: ConnectionTrait>(db: &C, value: i32) -> Result<thumbnails::Model> {
        if value <= 0 {
            return Err(anyhow!("Thumbnail size must be positive, got {}", value));
        }

        if let Some(existing) = Thumbnails::find()
            .filter(thumbnails::Column::Value.eq(value))
            .one(db)
            .await?
        {
            return Ok(existing);
        }

        let thumbnail = thumbnails::ActiveModel {
            value: Set(value),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Registered thumbnail size {}", value);
        Ok(thumbnail)
    }

    /// Creates the tier or replaces its capability and thumbnail set.
    pub async fn create_tier(
        db: &DatabaseConnection,
        name: &str,
        sizes: &[i32],
        can_create_link: bool,
    ) -> Result<TierProfile> {
        let name = tiers::normalize_name(name);
        if name.is_empty() {
            return Err(anyhow!("Tier name cannot be empty"));
        }

        let txn = db.begin().await?;

        let tier = match Tiers::find()
            .filter(tiers::Column::Name.eq(&name))
            .one(&txn)
            .await?
        {
            Some(existing) => {
                let mut active: tiers::ActiveModel = existing.into();
                active.can_create_link = Set(can_create_link);
                active.update(&txn).await?
            }
            None => {
                tiers::ActiveModel {
                    name: Set(name.clone()),
                    can_create_link: Set(can_create_link),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        TierThumbnails::delete_many()
            .filter(tier_thumbnails::Column::TierId.eq(tier.id))
            .exec(&txn)
            .await?;

        for size in sizes {
            let thumbnail = Self::create_thumbnail(&txn, *size).await?;
            // duplicates in `sizes` would violate the composite key
            let linked = TierThumbnails::find_by_id((tier.id, thumbnail.id))
                .one(&txn)
                .await?;
            if linked.is_none() {
                tier_thumbnails::ActiveModel {
                    tier_id: Set(tier.id),
                    thumbnail_id: Set(thumbnail.id),
                }
                .insert(&txn)
                .await?;
            }
        }

        let profile = Self::load_profile(&txn, tier.id)
            .await?
            .ok_or_else(|| anyhow!("Tier {} vanished during update", name))?;
        txn.commit().await?;

        info!(
            "Tier {} saved (sizes: {:?}, can_create_link: {})",
            profile.name(),
            profile.thumbnail_sizes,
            profile.can_create_link()
        );
        Ok(profile)
    }

    pub async fn find_tier_by_name(
        db: &DatabaseConnection,
        name: &str,
    ) -> Result<Option<tiers::Model>> {
        let tier = Tiers::find()
            .filter(tiers::Column::Name.eq(tiers::normalize_name(name)))
            .one(db)
            .await?;
        Ok(tier)
    }

    pub async fn create_user(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
        tier_name: Option<&str>,
    ) -> Result<users::Model> {
        let tier_id = match tier_name {
            Some(name) => Some(
                Self::find_tier_by_name(db, name)
                    .await?
                    .ok_or_else(|| anyhow!("Tier {} does not exist", name))?
                    .id,
            ),
            None => None,
        };

        let user = users::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            tier_id: Set(tier_id),
            created_at: Set(Some(Utc::now())),
        }
        .insert(db)
        .await?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Passing `None` removes the user's tier.
    pub async fn assign_tier(
        db: &DatabaseConnection,
        username: &str,
        tier_name: Option<&str>,
    ) -> Result<users::Model> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or_else(|| anyhow!("User {} does not exist", username))?;

        let tier_id = match tier_name {
            Some(name) => Some(
                Self::find_tier_by_name(db, name)
                    .await?
                    .ok_or_else(|| anyhow!("Tier {} does not exist", name))?
                    .id,
            ),
            None => None,
        };

        let mut active: users::ActiveModel = user.into();
        active.tier_id = Set(tier_id);
        Ok(active.update(db).await?)
    }

    pub async fn list_tiers(db: &DatabaseConnection) -> Result<Vec<TierProfile>> {
        let tiers = Tiers::find().order_by_asc(tiers::Column::Id).all(db).await?;
        let mut profiles = Vec::with_capacity(tiers.len());
        for tier in tiers {
            if let Some(profile) = Self::load_profile(db, tier.id).await? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }
}
