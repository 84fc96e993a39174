use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::AppError;
use crate::entities::{images, prelude::*, users};
use crate::services::storage::StorageService;
use crate::utils::validation::validate_upload;

/// One page of a user's images, ordered by id.
pub struct ImagePage {
    pub items: Vec<images::Model>,
    pub count: u64,
}

pub struct ImageService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    max_file_size: usize,
}

impl ImageService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, max_file_size: usize) -> Self {
        Self {
            db,
            storage,
            max_file_size,
        }
    }

    pub fn original_key(username: &str, ext: &str) -> String {
        format!("uploads/{}/{}.{}", username, uuid::Uuid::new_v4(), ext)
    }

    /// Validates and stores an original, then records it for `owner`.
    pub async fn upload(
        &self,
        owner: &users::Model,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<images::Model, AppError> {
        let ext = validate_upload(filename, &data, self.max_file_size)?;
        let file_key = Self::original_key(&owner.username, &ext);
        let size = data.len();

        self.storage.upload_file(&file_key, data).await?;

        let inserted = images::ActiveModel {
            user_id: Set(owner.id.clone()),
            file_key: Set(file_key.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(image) => {
                info!(
                    "Stored image {} for {} ({} bytes) at {}",
                    image.id, owner.username, size, file_key
                );
                Ok(image)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete_file(&file_key).await {
                    warn!("Failed to remove orphaned upload {}: {}", file_key, cleanup);
                }
                Err(e.into())
            }
        }
    }

    /// `page` is 1-based.
    pub async fn list(&self, user_id: &str, page: u64, page_size: u64) -> Result<ImagePage, AppError> {
        let paginator = Images::find()
            .filter(images::Column::UserId.eq(user_id))
            .order_by_asc(images::Column::Id)
            .paginate(&self.db, page_size.max(1));

        let count = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(ImagePage { items, count })
    }
}
