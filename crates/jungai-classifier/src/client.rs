//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Any non-success status, network failure, or malformed envelope surfaces
//! as [`ClassifierError::ModelUnavailable`]; interpreting the reply text is
//! left to the classifier.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::generator::{ChatRequest, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/";
const COMPLETIONS_PATH: &str = "v1/chat/completions";
/// Upper bound on error-body text kept in an error message.
const ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Client for a hosted chat-completions model.
///
/// Use [`OpenAiClient::new`] for production or
/// [`OpenAiClient::with_base_url`] to point at a compatible gateway or a
/// mock server in tests.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl OpenAiClient {
    /// Creates a client pointed at the public API.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Client`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ClassifierError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Client`] if the `reqwest::Client` cannot be
    /// constructed, or [`ClassifierError::InvalidBaseUrl`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("jungai/0.1 (archetype-classifier)")
            .build()?;

        // A trailing slash makes `join` append to the base path instead of
        // replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(COMPLETIONS_PATH))
            .map_err(|e| ClassifierError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ClassifierError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: 0.0,
            response_format: request.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::ModelUnavailable {
                status: e.status().map(|s| s.as_u16()),
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(ERROR_BODY_CHARS).collect();
            return Err(ClassifierError::ModelUnavailable {
                status: Some(status.as_u16()),
                reason: format!("completion request rejected: {}", detail.trim()),
            });
        }

        let envelope: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| ClassifierError::ModelUnavailable {
                    status: Some(status.as_u16()),
                    reason: format!("malformed completion envelope: {e}"),
                })?;

        let choice = envelope
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::ModelUnavailable {
                status: Some(status.as_u16()),
                reason: "completion response had no choices".to_string(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

impl TextGenerator for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<String, ClassifierError>> {
        self.complete(request).boxed()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
