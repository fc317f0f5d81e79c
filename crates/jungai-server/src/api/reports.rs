use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ReportsQuery {
    brand: Option<String>,
    limit: Option<usize>,
}

pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReportsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = normalize_limit(query.limit);
    let brand = query.brand.as_deref().filter(|b| !b.trim().is_empty());

    let reports = jungai_report::read_reports(&state.report_path, brand, limit)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "report read failed");
            ApiError::new(req_id.0.clone(), "internal_error", "failed to read reports")
        })?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: reports,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
