//! Tier-shaped image representations.
//!
//! A tier maps to a [`FieldSet`], a static allow-list of [`ImageField`]s. The
//! projector computes only the fields on that list, so a Basic caller never
//! pays for URLs it will not see.

use anyhow::Result;
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::entities::images;
use crate::services::storage::StorageService;
use crate::services::thumbnail_service::{ThumbnailRenderer, ThumbnailSpec};
use crate::services::tier_service::TierProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageField {
    Thumbnails,
    Image,
    BinaryImageLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    Basic,
    Premium,
    Enterprise,
}

impl FieldSet {
    pub fn for_tier(tier: &TierProfile) -> Self {
        match tier.name() {
            "Basic" => FieldSet::Basic,
            "Premium" => FieldSet::Premium,
            "Enterprise" => FieldSet::Enterprise,
            _ if tier.can_create_link() => FieldSet::Enterprise,
            _ => FieldSet::Premium,
        }
    }

    pub fn fields(self) -> &'static [ImageField] {
        match self {
            FieldSet::Basic => &[ImageField::Thumbnails],
            FieldSet::Premium => &[ImageField::Thumbnails, ImageField::Image],
            FieldSet::Enterprise => &[
                ImageField::Thumbnails,
                ImageField::Image,
                ImageField::BinaryImageLink,
            ],
        }
    }

    pub fn includes(self, field: ImageField) -> bool {
        self.fields().contains(&field)
    }
}

/// An image as its owner's tier is allowed to see it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ImageRepresentation {
    /// Thumbnail URL per height, ascending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<BTreeMap<i32, String>>,
    /// URL of the original upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Endpoint that mints a binary link for this image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_image_link: Option<String>,
}

pub struct ImageProjector {
    renderer: Arc<dyn ThumbnailRenderer>,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
}

impl ImageProjector {
    pub fn new(
        renderer: Arc<dyn ThumbnailRenderer>,
        storage: Arc<dyn StorageService>,
        config: AppConfig,
    ) -> Self {
        Self {
            renderer,
            storage,
            config,
        }
    }

    pub async fn project(
        &self,
        image: &images::Model,
        tier: &TierProfile,
    ) -> Result<ImageRepresentation> {
        let mut repr = ImageRepresentation::default();

        for field in FieldSet::for_tier(tier).fields() {
            match field {
                ImageField::Thumbnails => {
                    repr.thumbnails = Some(self.thumbnails(image, tier).await?);
                }
                ImageField::Image => {
                    repr.image = Some(self.storage.url_of(&image.file_key));
                }
                ImageField::BinaryImageLink => {
                    repr.binary_image_link = Some(
                        self.config
                            .absolute_url(&format!("/images/{}/create/", image.id)),
                    );
                }
            }
        }

        Ok(repr)
    }

    pub async fn project_all(
        &self,
        images: &[images::Model],
        tier: &TierProfile,
    ) -> Result<Vec<ImageRepresentation>> {
        try_join_all(images.iter().map(|image| self.project(image, tier))).await
    }

    async fn thumbnails(
        &self,
        image: &images::Model,
        tier: &TierProfile,
    ) -> Result<BTreeMap<i32, String>> {
        let renders = tier.thumbnail_sizes.iter().map(|&size| async move {
            let spec = ThumbnailSpec::new(size.max(1) as u32, self.config.thumbnail_quality);
            let url = self.renderer.render(&image.file_key, spec).await?;
            Ok::<_, anyhow::Error>((size, url))
        });
        Ok(try_join_all(renders).await?.into_iter().collect())
    }
}
