mod classify;
mod reports;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use jungai_classifier::{Classifier, ClassifierOptions, OpenAiClient, TextGenerator};
use jungai_core::{AppConfig, TruncationPolicy};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

pub type DynClassifier = Classifier<Box<dyn TextGenerator>>;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no model key is configured; classify requests then fail
    /// with `model_unavailable`.
    pub classifier: Option<Arc<DynClassifier>>,
    pub model: String,
    pub report_path: PathBuf,
    pub corpus_max_chars: usize,
    pub policy: TruncationPolicy,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl AppState {
    /// Build state from config, constructing the model client when a key is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the model client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let classifier = match config.openai_api_key.as_deref() {
            Some(key) => {
                let client = OpenAiClient::with_base_url(
                    key,
                    &config.model,
                    config.model_timeout_secs,
                    &config.model_base_url,
                )?;
                let generator: Box<dyn TextGenerator> = Box::new(client);
                Some(Arc::new(Classifier::new(
                    generator,
                    ClassifierOptions::from_config(config),
                )))
            }
            None => {
                tracing::warn!("OPENAI_API_KEY not set; /api/v1/classify will return 503");
                None
            }
        };

        Ok(Self {
            classifier,
            model: config.model.clone(),
            report_path: config.report_path.clone(),
            corpus_max_chars: config.corpus_max_chars,
            policy: config.truncation_policy,
            max_retries: config.model_max_retries,
            backoff_base_ms: config.model_backoff_base_ms,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    model: String,
    classifier: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "classification_failed" => StatusCode::BAD_GATEWAY,
            "model_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(50).clamp(1, 200)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/classify", post(classify::classify_text))
        .route("/api/v1/reports", get(reports::list_reports))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let (status, classifier) = if state.classifier.is_some() {
        ("ok", "configured")
    } else {
        ("degraded", "missing_api_key")
    };

    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status,
                model: state.model.clone(),
                classifier,
            },
            meta,
        }),
    )
}
