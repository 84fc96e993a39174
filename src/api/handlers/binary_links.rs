use crate::AppState;
use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct BinaryLinkResponse {
    /// URL of the grayscale rendition, or "Link expired"
    pub image: String,
}

/// Anyone holding the id may fetch the link while it lives.
#[utoipa::path(
    get,
    path = "/images/{id}/",
    params(
        ("id" = String, Path, description = "Binary link ID")
    ),
    responses(
        (status = 200, description = "Link is valid", body = BinaryLinkResponse),
        (status = 400, description = "Link expired or unknown", body = BinaryLinkResponse)
    ),
    tag = "binary-links"
)]
pub async fn get_binary_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BinaryLinkResponse>, AppError> {
    let image = state.binary_links.retrieve(&id).await?;
    Ok(Json(BinaryLinkResponse { image }))
}
