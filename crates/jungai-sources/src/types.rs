use chrono::{DateTime, Utc};
use jungai_core::SourceKind;
use serde::{Deserialize, Serialize};

use crate::text::{clip_chars, normalize_text};

/// Text retrieved from one provider, with where and when it came from.
///
/// Text is normalized and capped at construction; there is no way to change
/// a document afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDocument {
    kind: SourceKind,
    locator: String,
    title: Option<String>,
    text: String,
    retrieved_at: DateTime<Utc>,
}

impl SourceDocument {
    /// Per-document text cap, in characters.
    pub const MAX_CHARS: usize = 4000;

    /// Build a document retrieved now.
    #[must_use]
    pub fn new(
        kind: SourceKind,
        locator: impl Into<String>,
        title: Option<String>,
        raw_text: &str,
    ) -> Self {
        Self::retrieved(kind, locator, title, raw_text, Utc::now())
    }

    /// Build a document with an explicit retrieval timestamp.
    #[must_use]
    pub fn retrieved(
        kind: SourceKind,
        locator: impl Into<String>,
        title: Option<String>,
        raw_text: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        Self::capped(kind, locator, title, raw_text, retrieved_at, Self::MAX_CHARS)
    }

    /// Text posted directly for classification.
    ///
    /// Only `max_chars` bounds it, so a submission can use the whole corpus
    /// budget instead of the per-document cap applied to collected text.
    #[must_use]
    pub fn submitted(raw_text: &str, max_chars: usize) -> Self {
        Self::capped(
            SourceKind::Submitted,
            "submitted",
            None,
            raw_text,
            Utc::now(),
            max_chars,
        )
    }

    fn capped(
        kind: SourceKind,
        locator: impl Into<String>,
        title: Option<String>,
        raw_text: &str,
        retrieved_at: DateTime<Utc>,
        cap: usize,
    ) -> Self {
        let normalized = normalize_text(raw_text);
        let text = clip_chars(&normalized, cap).to_string();
        Self {
            kind,
            locator: locator.into().trim().to_string(),
            title: title.map(|t| normalize_text(&t)).filter(|t| !t.is_empty()),
            text,
            retrieved_at,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }

    /// Length of the text in Unicode scalar values.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// A connector that contributed nothing to a corpus, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGap {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub reason: String,
}
