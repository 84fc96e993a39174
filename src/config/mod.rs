use std::env;

/// Lower bound for `exist_seconds` on a binary link.
pub const MIN_LINK_SECONDS: i64 = 300;

/// Upper bound for `exist_seconds` on a binary link.
pub const MAX_LINK_SECONDS: i64 = 30_000;

/// Hard cap for the `page_size` query parameter.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Artifact store backend selected at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Local directory rooted at `media_root`
    Fs,
    /// S3 / MinIO bucket
    S3,
}

impl StorageBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "s3" | "minio" => StorageBackend::S3,
            _ => StorageBackend::Fs,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 20 MB)
    pub max_file_size: usize,

    /// JWT Secret Key
    pub jwt_secret: String,

    /// Externally visible base URL of this API, used for absolute links
    pub public_url: String,

    /// Which artifact store to use (default: fs)
    pub storage_backend: StorageBackend,

    /// Root directory of the filesystem artifact store
    pub media_root: String,

    /// Base URL under which `media_root` is served
    pub media_url: String,

    /// JPEG quality of rendered thumbnails (default: 99)
    pub thumbnail_quality: u8,

    /// Default page size of the image listing (default: 10)
    pub page_size: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let public_url = "http://localhost:3000".to_string();
        Self {
            max_file_size: 20 * 1024 * 1024, // 20 MB
            jwt_secret: "secret".to_string(),
            media_url: format!("{}/media", public_url),
            public_url,
            storage_backend: StorageBackend::Fs,
            media_root: "./media".to_string(),
            thumbnail_quality: 99,
            page_size: 10,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let public_url = env::var("PUBLIC_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(default.public_url);

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            media_url: env::var("MEDIA_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("{}/media", public_url)),

            public_url,

            storage_backend: env::var("STORAGE_BACKEND")
                .map(|v| StorageBackend::parse(&v))
                .unwrap_or(default.storage_backend),

            media_root: env::var("MEDIA_ROOT").unwrap_or(default.media_root),

            thumbnail_quality: env::var("THUMBNAIL_QUALITY")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .map(|q| q.clamp(1, 100))
                .unwrap_or(default.thumbnail_quality),

            page_size: env::var("PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s.clamp(1, MAX_PAGE_SIZE))
                .unwrap_or(default.page_size),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (local storage, relaxed limits)
    pub fn development() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024,
            allowed_origins: vec!["*".to_string()],
            ..Self::default()
        }
    }

    /// Create config for production. `JWT_SECRET` must be set.
    pub fn production() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: JWT_SECRET must be set"))?;
        Ok(Self {
            jwt_secret,
            ..Self::from_env()
        })
    }

    /// Absolute URL of an API path, e.g. `/images/1/create/`
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }
}
