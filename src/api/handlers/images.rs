use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::auth::MaybeCaller;
use crate::api::permissions::{CREATE_LINK, IMAGE_ACCESS};
use crate::config::MAX_PAGE_SIZE;
use crate::services::projection::ImageRepresentation;
use crate::utils::validation::validate_exist_seconds;
use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

/// Name of the multipart field carrying the upload
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Items per page, at most 100
    pub page_size: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ImageListResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<ImageRepresentation>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLinkRequest {
    /// Lifetime of the link in seconds (300 to 30000)
    pub exist_seconds: i64,
}

#[derive(Serialize, ToSchema)]
pub struct CreateLinkResponse {
    pub link: String,
}

fn page_url(state: &AppState, page: u64, page_size: Option<u64>) -> Result<String, AppError> {
    let mut url = Url::parse(&state.config.absolute_url("/images/"))
        .map_err(|e| AppError::Internal(format!("Invalid PUBLIC_URL: {}", e)))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("page", &page.to_string());
        if let Some(size) = page_size {
            query.append_pair("page_size", &size.to_string());
        }
    }
    Ok(url.to_string())
}

#[utoipa::path(
    get,
    path = "/images/",
    params(ListQuery),
    responses(
        (status = 200, description = "The caller's images, shaped by tier", body = ImageListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "User does not have tier"),
        (status = 404, description = "Invalid page")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "images"
)]
pub async fn list_images(
    State(state): State<AppState>,
    caller: MaybeCaller,
    Query(query): Query<ListQuery>,
) -> Result<Json<ImageListResponse>, AppError> {
    let caller = caller.authorize(IMAGE_ACCESS)?;
    let tier = caller.tier()?;

    let page = query.page.unwrap_or(1);
    let page_size = query
        .page_size
        .unwrap_or(state.config.page_size)
        .clamp(1, MAX_PAGE_SIZE);

    if page == 0 {
        return Err(AppError::NotFound("Invalid page.".to_string()));
    }

    let listed = state.images.list(&caller.user.id, page, page_size).await?;
    let num_pages = listed.count.div_ceil(page_size).max(1);
    if page > num_pages {
        return Err(AppError::NotFound("Invalid page.".to_string()));
    }

    let results = state.projector.project_all(&listed.items, tier).await?;

    let next = if page < num_pages {
        Some(page_url(&state, page + 1, query.page_size)?)
    } else {
        None
    };
    let previous = if page > 1 {
        Some(page_url(&state, page - 1, query.page_size)?)
    } else {
        None
    };

    Ok(Json(ImageListResponse {
        count: listed.count,
        next,
        previous,
        results,
    }))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/images/upload/",
    request_body(content = Object, description = "Image file in the `image` field", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = ImageRepresentation),
        (status = 400, description = "Unsupported extension or not an image"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "User does not have tier"),
        (status = 413, description = "File too large")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "images"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    caller: MaybeCaller,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ImageRepresentation>), AppError> {
    let caller = caller.authorize(IMAGE_ACCESS)?;
    let tier = caller.tier()?;
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?.to_vec();
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file was submitted.".to_string()))?;

    if data.len() > state.config.max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} MB limit",
            state.config.max_file_size / 1024 / 1024
        )));
    }

    let image = state.images.upload(&caller.user, &filename, data).await?;
    let repr = state.projector.project(&image, tier).await?;

    Ok((StatusCode::CREATED, Json(repr)))
}

#[utoipa::path(
    post,
    path = "/images/{id}/create/",
    params(
        ("id" = i32, Path, description = "Image ID")
    ),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Binary link created", body = CreateLinkResponse),
        (status = 400, description = "exist_seconds out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing tier or link permission"),
        (status = 404, description = "Image not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "images"
)]
pub async fn create_binary_link(
    State(state): State<AppState>,
    caller: MaybeCaller,
    Path(id): Path<String>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), AppError> {
    let caller = caller.authorize(CREATE_LINK)?;
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_exist_seconds(req.exist_seconds)?;

    let image_id: i32 = id
        .parse()
        .map_err(|_| AppError::NotFound("Image not found".to_string()))?;

    let link = state
        .binary_links
        .create(&caller.user, image_id, req.exist_seconds)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse {
            link: state.config.absolute_url(&format!("/images/{}/", link.id)),
        }),
    ))
}
