use anyhow::{Result, anyhow};
use async_trait::async_trait;
use dashmap::DashMap;
use image::{DynamicImage, ImageOutputFormat, imageops::FilterType};
use std::sync::Arc;
use tracing::{debug, info};

use crate::services::storage::StorageService;
use crate::utils::hash::cache_digest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropMode {
    Center,
}

impl CropMode {
    fn as_str(&self) -> &'static str {
        match self {
            CropMode::Center => "center",
        }
    }
}

/// What to render: a thumbnail `height` pixels tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThumbnailSpec {
    pub height: u32,
    pub crop: CropMode,
    pub quality: u8,
}

impl ThumbnailSpec {
    pub fn new(height: u32, quality: u8) -> Self {
        Self {
            height,
            crop: CropMode::Center,
            quality,
        }
    }

    /// Artifact key of the rendition of `original_key` under this spec.
    pub fn cache_key(&self, original_key: &str) -> String {
        let digest = cache_digest(&[
            original_key,
            &format!("x{}", self.height),
            self.crop.as_str(),
            &self.quality.to_string(),
        ]);
        format!("cache/{}/{}/{}.jpg", &digest[0..2], &digest[2..4], digest)
    }
}

#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    /// Returns the URL of the rendition, rendering it first when needed.
    async fn render(&self, original_key: &str, spec: ThumbnailSpec) -> Result<String>;
}

/// Renders into the artifact store and remembers what it has already stored.
pub struct CachedThumbnailRenderer {
    storage: Arc<dyn StorageService>,
    rendered: DashMap<String, String>,
}

impl CachedThumbnailRenderer {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self {
            storage,
            rendered: DashMap::new(),
        }
    }
}

#[async_trait]
impl ThumbnailRenderer for CachedThumbnailRenderer {
    async fn render(&self, original_key: &str, spec: ThumbnailSpec) -> Result<String> {
        let key = spec.cache_key(original_key);
        if let Some(url) = self.rendered.get(&key) {
            return Ok(url.value().clone());
        }

        if !self.storage.file_exists(&key).await? {
            let original = self.storage.get_file(original_key).await?;
            let thumbnail =
                tokio::task::spawn_blocking(move || render_thumbnail(&original, spec)).await??;
            self.storage.upload_file(&key, thumbnail).await?;
            info!(
                "Rendered {}px thumbnail of {} into {}",
                spec.height, original_key, key
            );
        } else {
            debug!("Thumbnail {} already stored", key);
        }

        let url = self.storage.url_of(&key);
        self.rendered.insert(key, url.clone());
        Ok(url)
    }
}

/// Size of the box a `height`-tall thumbnail of a `width`x`orig_height`
/// original fills, keeping aspect ratio.
pub fn target_dimensions(width: u32, orig_height: u32, height: u32) -> (u32, u32) {
    let height = height.max(1);
    if orig_height == 0 {
        return (1, height);
    }
    let scaled = (u64::from(width) * u64::from(height) + u64::from(orig_height) / 2)
        / u64::from(orig_height);
    (scaled.clamp(1, u64::from(u32::MAX)) as u32, height)
}

pub fn render_thumbnail(data: &[u8], spec: ThumbnailSpec) -> Result<Vec<u8>> {
    let img =
        image::load_from_memory(data).map_err(|e| anyhow!("Failed to load image: {}", e))?;

    let (width, height) = target_dimensions(img.width(), img.height(), spec.height);
    let thumbnail = match spec.crop {
        CropMode::Center => img.resize_to_fill(width, height, FilterType::Lanczos3),
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(thumbnail.to_rgb8());
    let mut out = Vec::new();
    rgb.write_to(
        &mut std::io::Cursor::new(&mut out),
        ImageOutputFormat::Jpeg(spec.quality.clamp(1, 100)),
    )
    .map_err(|e| anyhow!("Failed to encode JPEG thumbnail: {}", e))?;
    Ok(out)
}
