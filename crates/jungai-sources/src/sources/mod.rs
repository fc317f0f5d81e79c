//! Provider connectors and their construction from configuration.

mod google_cse;
mod reddit;
mod reddit_helpers;
mod youtube;

pub use google_cse::SearchConnector;
pub use reddit::DiscussionConnector;
pub use youtube::VideoTranscriptConnector;

use jungai_core::AppConfig;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::connector::Connector;

/// Build every connector whose credentials are configured, in slot order
/// search, video transcript, discussion.
///
/// Connectors missing credentials are skipped with a warning. The discussion
/// connector needs none; it falls back to the public listing.
#[must_use]
pub fn connectors_from_config(config: &AppConfig) -> Vec<Box<dyn Connector>> {
    let mut connectors: Vec<Box<dyn Connector>> = Vec::new();

    match (&config.google_api_key, &config.google_cse_id) {
        (Some(key), Some(cx)) => {
            match SearchConnector::new(key, cx, &config.user_agent, config.search) {
                Ok(c) => connectors.push(Box::new(c)),
                Err(e) => {
                    tracing::warn!(
                        source = "search",
                        error = %e,
                        "search connector disabled"
                    );
                }
            }
        }
        _ => tracing::warn!(
            source = "search",
            "GOOGLE_API_KEY or GOOGLE_CSE_ID not set; search connector disabled"
        ),
    }

    match &config.youtube_api_key {
        Some(key) => match VideoTranscriptConnector::new(key, config.video) {
            Ok(c) => connectors.push(Box::new(c)),
            Err(e) => {
                tracing::warn!(
                    source = "video_transcript",
                    error = %e,
                    "video connector disabled"
                );
            }
        },
        None => tracing::warn!(
            source = "video_transcript",
            "YOUTUBE_API_KEY not set; video transcript connector disabled"
        ),
    }

    match DiscussionConnector::new(&config.reddit_user_agent, config.discussion) {
        Ok(c) => {
            let connector = match (&config.reddit_client_id, &config.reddit_client_secret) {
                (Some(id), Some(secret)) => c.with_credentials(id, secret),
                _ => {
                    tracing::info!(
                        source = "discussion",
                        "Reddit credentials not set; using public search"
                    );
                    c
                }
            };
            connectors.push(Box::new(connector));
        }
        Err(e) => {
            tracing::warn!(
                source = "discussion",
                error = %e,
                "discussion connector disabled"
            );
        }
    }

    connectors
}

/// Seconds from a numeric `Retry-After` header.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
