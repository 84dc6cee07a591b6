use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{SummaryPayload, SummaryService};

/// GET /ringkasan - Procurement summary for the caller's scope
pub async fn index(Extension(auth): Extension<AuthUser>) -> ApiResult<SummaryPayload> {
    let service = SummaryService::new().await?;
    let payload = service.summary(auth.principal()).await?;

    Ok(ApiResponse::success(payload))
}
