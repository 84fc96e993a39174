#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use rust_image_backend::config::{AppConfig, StorageBackend};
use rust_image_backend::entities::users;
use rust_image_backend::infrastructure::{database, seed};
use rust_image_backend::services::storage::StorageService;
use rust_image_backend::services::tier_service::TierService;
use rust_image_backend::utils::auth::create_jwt;
use rust_image_backend::utils::clock::ManualClock;
use rust_image_backend::{AppState, create_app};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const PUBLIC_URL: &str = "http://testserver";
pub const MEDIA_URL: &str = "http://media.test";
pub const BOUNDARY: &str = "X-TEST-BOUNDARY";

pub async fn setup_test_db() -> DatabaseConnection {
    // every pooled connection to :memory: would be its own database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    seed::seed_default_tiers(&db).await.unwrap();
    db
}

#[derive(Default)]
pub struct MockStorageService {
    files: Mutex<HashMap<String, Vec<u8>>>,
    deletes: Mutex<Vec<String>>,
    ops: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of storage calls made so far
    pub fn ops(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).cloned()
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn deletes_of(&self, key: &str) -> usize {
        self.deletes
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.as_str() == key)
            .count()
    }

    /// Every delete attempted so far, failed ones included
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    /// Makes `upload_file` fail until switched back
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Makes `delete_file` fail and keep the file until switched back
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn touch(&self) {
        self.ops.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> anyhow::Result<()> {
        self.touch();
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("EIO: upload of {} failed", key));
        }
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get_file(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.touch();
        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Key not found"))
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        self.touch();
        self.deletes.lock().unwrap().push(key.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("EIO: delete of {} failed", key));
        }
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        self.touch();
        Ok(self.files.lock().unwrap().contains_key(key))
    }

    fn url_of(&self, key: &str) -> String {
        format!("{}/{}", MEDIA_URL, key)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        public_url: PUBLIC_URL.to_string(),
        media_url: MEDIA_URL.to_string(),
        storage_backend: StorageBackend::S3,
        ..AppConfig::development()
    }
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub storage: Arc<MockStorageService>,
    pub clock: Arc<ManualClock>,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_test_db().await;
        let storage = Arc::new(MockStorageService::new());
        let clock = Arc::new(ManualClock::default());
        let config = test_config();

        let state = AppState::new(db.clone(), storage.clone(), clock.clone(), config.clone());

        Self {
            app: create_app(state),
            db,
            storage,
            clock,
            config,
        }
    }

    /// Creates a user on `tier` and returns it with a valid bearer token.
    pub async fn user(&self, username: &str, tier: Option<&str>) -> (users::Model, String) {
        let email = format!("{}@Example.COM", username);
        let user = TierService::create_user(&self.db, username, &email, tier)
            .await
            .unwrap();
        let token = create_jwt(&user.id, &self.config.jwt_secret).unwrap();
        (user, token)
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), ImageOutputFormat::Png)
        .unwrap();
    out
}

pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(token: Option<&str>, filename: &str, data: &[u8]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/images/upload/")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(multipart_body("image", filename, data)))
        .unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn create_link_request(image_id: i32, token: Option<&str>, exist_seconds: i64) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/images/{}/create/", image_id))
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(format!(
            r#"{{"exist_seconds": {}}}"#,
            exist_seconds
        )))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
