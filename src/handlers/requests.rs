use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{RequestInput, RequestService, VenueService};

use super::PageQuery;

/// GET /procurement-requests - Paginated list within the caller's scope
pub async fn index(
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Value> {
    let service = RequestService::new().await?;
    let requests = service.list(auth.principal(), query.page).await?;

    Ok(ApiResponse::success(json!({
        "procurement_requests": requests,
        "can_manage_all": auth.principal().is_superadmin(),
    })))
}

/// GET /tambah-barang - Request-creation form data. Only active venues are
/// offered here; this is a form convenience, not a stored invariant.
pub async fn create_form(Extension(_auth): Extension<AuthUser>) -> ApiResult<Value> {
    let venues = VenueService::new().await?.list_active().await?;

    Ok(ApiResponse::success(json!({ "venues": venues })))
}

/// POST /procurement-requests - File a request; the caller becomes owner
pub async fn store(
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<RequestInput>,
) -> ApiResult<Value> {
    let service = RequestService::new().await?;
    let request = service.create(auth.principal(), input).await?;

    Ok(ApiResponse::created(json!({ "procurement_request": request })))
}

/// GET /procurement-requests/:id - Scoped detail view
pub async fn show(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = RequestService::new().await?;
    let request = service.get(auth.principal(), id).await?;

    Ok(ApiResponse::success(json!({ "procurement_request": request })))
}

/// GET /procurement-requests/:id/edit - Edit-form data for owner/superadmin
pub async fn edit(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = RequestService::new().await?;
    let request = service.get_for_edit(auth.principal(), id).await?;
    let venues = VenueService::new().await?.list_active().await?;

    Ok(ApiResponse::success(json!({
        "procurement_request": request,
        "venues": venues,
    })))
}

/// PUT /procurement-requests/:id - Update by owner/superadmin
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<RequestInput>,
) -> ApiResult<Value> {
    let service = RequestService::new().await?;
    let request = service.update(auth.principal(), id, input).await?;

    Ok(ApiResponse::success(json!({ "procurement_request": request })))
}

/// DELETE /procurement-requests/:id - Hard delete by owner/superadmin
pub async fn destroy(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = RequestService::new().await?;
    service.delete(auth.principal(), id).await?;

    Ok(ApiResponse::success(json!({ "deleted": true, "id": id })))
}
