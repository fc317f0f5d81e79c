use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use jungai_classifier::{classify_with_backoff, ClassifierError};
use jungai_core::BrandQuery;
use jungai_sources::AggregatedCorpus;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ClassifyRequest {
    text: String,
    #[serde(default)]
    brand: Option<String>,
}

pub(super) async fn classify_text(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ClassifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let brand = body
        .brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or("ad-hoc");

    let Some(corpus) = AggregatedCorpus::submitted(
        BrandQuery::new(brand),
        &body.text,
        state.corpus_max_chars,
        state.policy,
    ) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "text must be non-empty",
        ));
    };

    let Some(classifier) = state.classifier.as_deref() else {
        return Err(ApiError::new(
            req_id.0,
            "model_unavailable",
            "no model API key is configured",
        ));
    };

    let result =
        classify_with_backoff(classifier, &corpus, state.max_retries, state.backoff_base_ms).await;
    match result {
        Ok(verdict) => Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: verdict,
                meta: ResponseMeta::new(req_id.0),
            }),
        )),
        Err(e) => {
            tracing::warn!(brand = %corpus.brand().slug(), error = %e, "classify request failed");
            Err(map_classifier_error(req_id.0, &e))
        }
    }
}

fn map_classifier_error(request_id: String, error: &ClassifierError) -> ApiError {
    match error {
        ClassifierError::ClassificationParse { reason, .. } => ApiError::new(
            request_id,
            "classification_failed",
            format!("model reply did not name one archetype: {reason}"),
        ),
        ClassifierError::ModelUnavailable { .. } => {
            ApiError::new(request_id, "model_unavailable", error.to_string())
        }
        ClassifierError::InputBudget { .. }
        | ClassifierError::InvalidBaseUrl { .. }
        | ClassifierError::Client(_) => {
            ApiError::new(request_id, "internal_error", "classifier misconfigured")
        }
    }
}
