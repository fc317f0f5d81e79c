use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER},
        HeaderMap, HeaderName, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use jungai_core::{AppConfig, Environment};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request id carried in request extensions and echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepted bearer tokens; `None` means auth is off.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Option<Arc<HashSet<String>>>,
}

impl AuthState {
    /// Auth from `AppConfig::api_keys`.
    ///
    /// An empty key list turns auth off in development and fails startup
    /// everywhere else.
    ///
    /// # Errors
    ///
    /// Returns an error when no keys are configured outside development.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if !config.api_keys.is_empty() {
            return Ok(Self::with_keys(config.api_keys.iter().cloned()));
        }
        if config.env == Environment::Development {
            tracing::warn!("JUNGAI_API_KEYS empty; bearer auth disabled in development");
            return Ok(Self::disabled());
        }
        anyhow::bail!("JUNGAI_API_KEYS is required in the {} environment", config.env)
    }

    #[must_use]
    pub fn with_keys(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: Some(Arc::new(keys.into_iter().collect())),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { keys: None }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.keys.is_some()
    }

    fn admits(&self, headers: &HeaderMap) -> bool {
        match &self.keys {
            None => true,
            Some(keys) => bearer_token(headers).is_some_and(|token| keys.contains(token)),
        }
    }
}

/// Fixed-window request counter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    quota: usize,
    window: Duration,
    current: Arc<Mutex<(Instant, usize)>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(quota: usize, window: Duration) -> Self {
        Self {
            quota,
            window,
            current: Arc::new(Mutex::new((Instant::now(), 0))),
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    /// Count one request, or return how long until the window resets.
    async fn admit(&self) -> Result<(), Duration> {
        let mut current = self.current.lock().await;
        let (started, count) = &mut *current;
        if started.elapsed() >= self.window {
            *started = Instant::now();
            *count = 0;
        }
        if *count >= self.quota {
            return Err(self.window.saturating_sub(started.elapsed()));
        }
        *count += 1;
        Ok(())
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Reuses an incoming `x-request-id` or mints a `UUIDv4`, then stores it as
/// [`RequestId`] and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if auth.admits(req.headers()) {
        return next.run(req).await;
    }
    ApiError::new(
        request_id_of(&req),
        "unauthorized",
        "missing or invalid bearer token",
    )
    .into_response()
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    match rate_limit.admit().await {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let retry_after = wait.as_secs().max(1);
            tracing::warn!(retry_after, "rate limit exceeded");
            let mut response =
                ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded")
                    .into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let (scheme, token) = headers.get(AUTHORIZATION)?.to_str().ok()?.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
