use jungai_core::SourceKind;
use thiserror::Error;

use crate::types::SourceGap;

/// Failure of a single connector call. Never fatal to a run on its own.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("{source_kind} source unavailable: {reason}")]
    SourceUnavailable {
        source_kind: SourceKind,
        reason: String,
    },

    #[error("{source_kind} source rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited {
        source_kind: SourceKind,
        retry_after_secs: Option<u64>,
    },
}

impl ConnectorError {
    pub(crate) fn unavailable(source_kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_kind,
            reason: reason.into(),
        }
    }

    /// Map a non-success HTTP status to the matching connector error.
    pub(crate) fn from_status(
        source_kind: SourceKind,
        status: reqwest::StatusCode,
        retry_after_secs: Option<u64>,
        context: &str,
    ) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                source_kind,
                retry_after_secs,
            }
        } else {
            Self::unavailable(source_kind, format!("{context} returned status {status}"))
        }
    }

    pub(crate) fn http(source_kind: SourceKind, err: &reqwest::Error) -> Self {
        Self::unavailable(source_kind, format!("request failed: {err}"))
    }

    #[must_use]
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::SourceUnavailable { source_kind, .. } | Self::RateLimited { source_kind, .. } => {
                *source_kind
            }
        }
    }

    /// Short reason recorded in a corpus gap.
    #[must_use]
    pub fn gap_reason(&self) -> String {
        match self {
            Self::SourceUnavailable { reason, .. } => reason.clone(),
            Self::RateLimited {
                retry_after_secs, ..
            } => format!("rate limited{}", retry_hint(retry_after_secs)),
        }
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs
        .map(|s| format!(" (retry after {s}s)"))
        .unwrap_or_default()
}

/// Run-terminal aggregation failure.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("no data available for brand '{brand}' ({} source gap(s))", .gaps.len())]
    NoDataAvailable { brand: String, gaps: Vec<SourceGap> },
}
