use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{VenueInput, VenueService};

use super::PageQuery;

/// GET /venues - Paginated venue list, readable by every authenticated user
pub async fn index(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Value> {
    let service = VenueService::new().await?;
    let venues = service.list(query.page).await?;

    Ok(ApiResponse::success(json!({
        "venues": venues,
        "can_manage_venues": auth.principal().is_superadmin(),
    })))
}

/// POST /venues - Create a venue (superadmin only)
pub async fn store(
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<VenueInput>,
) -> ApiResult<Value> {
    let service = VenueService::new().await?;
    let venue = service.create(auth.principal(), input).await?;

    Ok(ApiResponse::created(json!({ "venue": venue })))
}

/// GET /venues/:id - Venue detail with its requests reduced to the
/// caller's read scope
pub async fn show(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = VenueService::new().await?;
    let (venue, requests) = service.get_with_requests(auth.principal(), id).await?;

    Ok(ApiResponse::success(json!({
        "venue": venue,
        "procurement_requests": requests,
    })))
}

/// GET /venues/:id/edit - Edit-form data (superadmin only)
pub async fn edit(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    if !auth.principal().can_update_venue() {
        return Err(ApiError::forbidden("Only superadmins can edit venues"));
    }

    let service = VenueService::new().await?;
    let venue = service.get(id).await?;

    Ok(ApiResponse::success(json!({ "venue": venue })))
}

/// PUT /venues/:id - Update a venue (superadmin only)
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<VenueInput>,
) -> ApiResult<Value> {
    let service = VenueService::new().await?;
    let venue = service.update(auth.principal(), id, input).await?;

    Ok(ApiResponse::success(json!({ "venue": venue })))
}

/// DELETE /venues/:id - Hard delete; refused while requests reference it
pub async fn destroy(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = VenueService::new().await?;
    service.delete(auth.principal(), id).await?;

    Ok(ApiResponse::success(json!({ "deleted": true, "id": id })))
}
