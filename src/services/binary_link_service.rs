use anyhow::{Result, anyhow};
use image::ImageOutputFormat;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::error::AppError;
use crate::entities::{binary_image_links, images, prelude::*, users};
use crate::services::storage::StorageService;
use crate::utils::clock::Clock;
use crate::utils::validation::validate_exist_seconds;

/// Single-channel 8-bit luminance PNG of `data`.
pub fn to_grayscale_png(data: &[u8]) -> Result<Vec<u8>> {
    let img =
        image::load_from_memory(data).map_err(|e| anyhow!("Failed to load image: {}", e))?;
    let gray = image::DynamicImage::ImageLuma8(img.to_luma8());

    let mut out = Vec::new();
    gray.write_to(&mut std::io::Cursor::new(&mut out), ImageOutputFormat::Png)
        .map_err(|e| anyhow!("Failed to encode PNG: {}", e))?;
    Ok(out)
}

pub struct BinaryLinkService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    clock: Arc<dyn Clock>,
}

impl BinaryLinkService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { db, storage, clock }
    }

    pub fn binary_key(username: &str) -> String {
        format!("uploads/{}/binary/{}.png", username, uuid::Uuid::new_v4())
    }

    /// Renders a grayscale copy of one of `owner`'s images and mints a link
    /// that lives for `exist_seconds`.
    pub async fn create(
        &self,
        owner: &users::Model,
        image_id: i32,
        exist_seconds: i64,
    ) -> Result<binary_image_links::Model, AppError> {
        let exist_seconds = validate_exist_seconds(exist_seconds)?;

        let image = Images::find_by_id(image_id)
            .filter(images::Column::UserId.eq(owner.id.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        let original = self.storage.get_file(&image.file_key).await?;
        let binary = tokio::task::spawn_blocking(move || to_grayscale_png(&original))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        let file_key = Self::binary_key(&owner.username);
        self.storage.upload_file(&file_key, binary).await?;

        let inserted = binary_image_links::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(owner.id.clone()),
            file_key: Set(file_key.clone()),
            exist_seconds: Set(exist_seconds),
            created_at: Set(self.clock.now()),
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(link) => {
                info!(
                    "Binary link {} for image {} valid until {}",
                    link.id,
                    image.id,
                    link.expires_at()
                );
                Ok(link)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete_file(&file_key).await {
                    warn!("Failed to remove orphaned rendition {}: {}", file_key, cleanup);
                }
                Err(e.into())
            }
        }
    }

    /// URL of the rendition behind `id`, or [`AppError::LinkExpired`].
    ///
    /// Expired links are removed on first sight. Of several concurrent
    /// requests only the one whose delete removed the row touches the file.
    pub async fn retrieve(&self, id: &str) -> Result<String, AppError> {
        let Some(link) = BinaryImageLinks::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::LinkExpired);
        };

        if !link.is_expired_at(self.clock.now()) {
            return Ok(self.storage.url_of(&link.file_key));
        }

        let removed = BinaryImageLinks::delete_by_id(link.id.clone())
            .exec(&self.db)
            .await?;
        if removed.rows_affected == 1 {
            match self.storage.delete_file(&link.file_key).await {
                Ok(()) => info!("Binary link {} expired and removed", link.id),
                Err(e) => warn!(
                    "Binary link {} expired but rendition {} was not removed: {}",
                    link.id, link.file_key, e
                ),
            }
        } else {
            debug!("Binary link {} already removed", link.id);
        }

        Err(AppError::LinkExpired)
    }
}
