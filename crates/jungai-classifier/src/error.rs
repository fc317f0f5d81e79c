use thiserror::Error;

/// Errors returned by the classifier adapter and its model client.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Transport failure or non-success response from the model service.
    #[error("model unavailable{}: {reason}", status_hint(.status))]
    ModelUnavailable { status: Option<u16>, reason: String },

    /// The model's reply did not name exactly one archetype, even after the
    /// strict retry.
    #[error("classification parse error: {reason}")]
    ClassificationParse { reason: String, response: String },

    /// The model input limit cannot hold the fixed prompt plus any corpus
    /// text. Raised before a request is sent.
    #[error(
        "model input limit of {limit} characters leaves no room for corpus text \
         (fixed prompt needs {required})"
    )]
    InputBudget { limit: usize, required: usize },

    /// The model base URL could not be parsed.
    #[error("invalid model base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ClassifierError {
    /// Whether a back-off retry could succeed.
    ///
    /// Network failures, timeouts, 408, 429, and 5xx are transient; other
    /// statuses (bad key, unknown model) and parse failures are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ModelUnavailable { status: None, .. } => true,
            Self::ModelUnavailable {
                status: Some(code), ..
            } => *code == 408 || *code == 429 || *code >= 500,
            Self::ClassificationParse { .. }
            | Self::InputBudget { .. }
            | Self::InvalidBaseUrl { .. }
            | Self::Client(_) => false,
        }
    }
}

fn status_hint(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}
