pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::binary_link_service::BinaryLinkService;
use crate::services::image_service::ImageService;
use crate::services::projection::ImageProjector;
use crate::services::storage::StorageService;
use crate::services::thumbnail_service::{CachedThumbnailRenderer, ThumbnailRenderer};
use crate::utils::clock::Clock;
use axum::{
    Router,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::images::list_images,
        api::handlers::images::upload_image,
        api::handlers::images::create_binary_link,
        api::handlers::binary_links::get_binary_link,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::images::ImageListResponse,
            api::handlers::images::CreateLinkRequest,
            api::handlers::images::CreateLinkResponse,
            api::handlers::binary_links::BinaryLinkResponse,
            services::projection::ImageRepresentation,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "images", description = "Image upload, listing and binary links"),
        (name = "binary-links", description = "Public expiring links"),
        (name = "system", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub projector: Arc<ImageProjector>,
    pub images: Arc<ImageService>,
    pub binary_links: Arc<BinaryLinkService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        let renderer: Arc<dyn ThumbnailRenderer> =
            Arc::new(CachedThumbnailRenderer::new(storage.clone()));
        Self::with_renderer(db, storage, renderer, clock, config)
    }

    pub fn with_renderer(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        renderer: Arc<dyn ThumbnailRenderer>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        let projector = Arc::new(ImageProjector::new(
            renderer,
            storage.clone(),
            config.clone(),
        ));
        let images = Arc::new(ImageService::new(
            db.clone(),
            storage.clone(),
            config.max_file_size,
        ));
        let binary_links = Arc::new(BinaryLinkService::new(db.clone(), storage.clone(), clock));

        Self {
            db,
            storage,
            projector,
            images,
            binary_links,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    cors.allow_origin(origins)
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/images/", get(api::handlers::images::list_images))
        .route(
            "/images/upload/",
            post(api::handlers::images::upload_image).layer(
                axum::extract::DefaultBodyLimit::max(
                    state.config.max_file_size + MULTIPART_OVERHEAD,
                ),
            ),
        )
        .route(
            "/images/:id/create/",
            post(api::handlers::images::create_binary_link),
        )
        .route(
            "/images/:id/",
            get(api::handlers::binary_links::get_binary_link),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::identify_caller,
        ))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
