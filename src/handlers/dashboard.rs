use axum::Extension;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::SummaryService;

/// GET /dashboard - Role-dependent stats and request rows
pub async fn index(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let service = SummaryService::new().await?;
    let payload = service.dashboard(auth.principal()).await?;

    let mut body = serde_json::to_value(payload).map_err(|e| {
        tracing::error!("Failed to serialize dashboard payload: {}", e);
        ApiError::internal_server_error("Failed to format response")
    })?;
    body["user"] = json!({
        "id": auth.id,
        "name": auth.name,
        "role": auth.role,
    });

    Ok(ApiResponse::success(body))
}
