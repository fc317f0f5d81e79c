//! Video transcript connector: `YouTube` Data API search plus timed-text captions.

use std::time::Duration;

use futures::{future::BoxFuture, stream, FutureExt, StreamExt};
use jungai_core::{BrandQuery, SourceKind, SourceSettings};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::text::decode_entities;
use crate::types::SourceDocument;

use super::retry_after_secs;

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_TRANSCRIPT_URL: &str = "https://www.youtube.com/api/timedtext";
/// Data API page-size ceiling.
const MAX_SEARCH_RESULTS: usize = 50;
/// Shorter transcripts are usually music-only or auto-caption stubs.
const MIN_TRANSCRIPT_CHARS: usize = 200;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const TRANSCRIPT_CONCURRENCY: usize = 4;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
}

#[derive(Debug)]
struct Video {
    id: String,
    title: Option<String>,
}

/// Searches videos about a brand and collects their English transcripts.
pub struct VideoTranscriptConnector {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    transcript_url: String,
    settings: SourceSettings,
}

impl VideoTranscriptConnector {
    /// # Errors
    ///
    /// Returns [`ConnectorError::SourceUnavailable`] if the HTTP client
    /// cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        settings: SourceSettings,
    ) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConnectorError::http(SourceKind::VideoTranscript, &e))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            transcript_url: DEFAULT_TRANSCRIPT_URL.to_string(),
            settings,
        })
    }

    /// Override both endpoints (used by tests).
    #[must_use]
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        transcript_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.transcript_url = transcript_url.into();
        self
    }

    async fn search_videos(&self, brand: &BrandQuery) -> Result<Vec<Video>, ConnectorError> {
        let max_results = self.settings.max_results.min(MAX_SEARCH_RESULTS).to_string();
        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", brand.name()),
                ("part", "snippet"),
                ("type", "video"),
                ("relevanceLanguage", "en"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ConnectorError::http(SourceKind::VideoTranscript, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::from_status(
                SourceKind::VideoTranscript,
                status,
                retry_after_secs(response.headers()),
                "video search",
            ));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            ConnectorError::unavailable(
                SourceKind::VideoTranscript,
                format!("video search response parse error: {e}"),
            )
        })?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|item| {
                Some(Video {
                    id: item.id.video_id.filter(|id| !id.is_empty())?,
                    title: item.snippet.and_then(|s| s.title),
                })
            })
            .collect())
    }

    async fn fetch_transcript(&self, brand_slug: &str, video: Video) -> Option<SourceDocument> {
        let url = format!(
            "{}?lang=en&v={}",
            self.transcript_url,
            utf8_percent_encode(&video.id, NON_ALPHANUMERIC)
        );

        let body = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(
                        brand = brand_slug,
                        video = %video.id,
                        error = %e,
                        "transcript body unreadable"
                    );
                    return None;
                }
            },
            Ok(resp) => {
                tracing::debug!(
                    brand = brand_slug,
                    video = %video.id,
                    status = %resp.status(),
                    "no transcript"
                );
                return None;
            }
            Err(e) => {
                tracing::debug!(
                    brand = brand_slug,
                    video = %video.id,
                    error = %e,
                    "transcript fetch failed"
                );
                return None;
            }
        };

        let text = match parse_transcript(&body) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(
                    brand = brand_slug,
                    video = %video.id,
                    error = %e,
                    "malformed transcript"
                );
                return None;
            }
        };

        if text.chars().count() < MIN_TRANSCRIPT_CHARS {
            tracing::debug!(brand = brand_slug, video = %video.id, "transcript too short");
            return None;
        }

        Some(SourceDocument::new(
            SourceKind::VideoTranscript,
            format!("https://www.youtube.com/watch?v={}", video.id),
            video.title,
            &text,
        ))
    }

    async fn fetch_documents(
        &self,
        brand: &BrandQuery,
    ) -> Result<Vec<SourceDocument>, ConnectorError> {
        let slug = brand.slug();
        let videos = self.search_videos(brand).await?;
        let candidates = videos.len();

        let documents: Vec<SourceDocument> = stream::iter(videos)
            .map(|video| self.fetch_transcript(&slug, video))
            .buffered(TRANSCRIPT_CONCURRENCY)
            .filter_map(|doc| async move { doc })
            .collect()
            .await;

        tracing::debug!(
            brand = %slug,
            candidates,
            kept = documents.len(),
            "video transcripts collected"
        );
        Ok(documents)
    }
}

impl Connector for VideoTranscriptConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::VideoTranscript
    }

    fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    fn fetch<'a>(
        &'a self,
        brand: &'a BrandQuery,
    ) -> BoxFuture<'a, Result<Vec<SourceDocument>, ConnectorError>> {
        self.fetch_documents(brand).boxed()
    }
}

/// Join caption segments from a timed-text document.
///
/// Accepts both the legacy `<transcript><text>` layout and the
/// `<timedtext><body><p>` layout. Caption text is often entity-escaped twice.
fn parse_transcript(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_segment = false;
    let mut segments: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if matches!(e.name().as_ref(), b"text" | b"p") {
                    in_segment = true;
                    segments.push(String::new());
                }
            }
            Ok(Event::Text(e)) => {
                if in_segment {
                    let piece = e
                        .unescape()
                        .map(std::borrow::Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    if let Some(current) = segments.last_mut() {
                        if !current.is_empty() {
                            current.push(' ');
                        }
                        current.push_str(&decode_entities(&piece));
                    }
                }
            }
            Ok(Event::End(e)) => {
                if matches!(e.name().as_ref(), b"text" | b"p") {
                    in_segment = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e),
            _ => {}
        }
    }

    Ok(segments
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" "))
}
