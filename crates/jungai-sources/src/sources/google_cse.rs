//! Web search connector backed by the Google Custom Search JSON API.

use std::collections::HashSet;
use std::time::Duration;

use futures::{future::BoxFuture, stream, FutureExt, StreamExt};
use jungai_core::{BrandQuery, SourceKind, SourceSettings};
use serde::Deserialize;

use crate::connector::Connector;
use crate::corpus::canonical_locator;
use crate::error::ConnectorError;
use crate::text::extract_main_text;
use crate::types::SourceDocument;

use super::retry_after_secs;

const DEFAULT_API_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The API serves at most 100 results per query.
const MAX_START: usize = 91;
const PAGE_SIZE: usize = 10;
/// Pages with less extracted text than this are navigation or error pages.
const MIN_PAGE_CHARS: usize = 400;
const PAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_FETCH_CONCURRENCY: usize = 4;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Clone)]
struct SearchHit {
    link: String,
    title: Option<String>,
}

/// Finds pages about a brand and extracts their main text.
pub struct SearchConnector {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    api_url: String,
    user_agent: String,
    settings: SourceSettings,
}

impl SearchConnector {
    /// # Errors
    ///
    /// Returns [`ConnectorError::SourceUnavailable`] if the HTTP client
    /// cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        user_agent: impl Into<String>,
        settings: SourceSettings,
    ) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(PAGE_FETCH_TIMEOUT)
            .build()
            .map_err(|e| ConnectorError::http(SourceKind::Search, &e))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: user_agent.into(),
            settings,
        })
    }

    /// Point the connector at a different search endpoint (used by tests).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn search_page(
        &self,
        query: &str,
        start: usize,
    ) -> Result<Vec<SearchHit>, ConnectorError> {
        let start_param = start.to_string();
        let num_param = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("start", start_param.as_str()),
                ("num", num_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ConnectorError::http(SourceKind::Search, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::from_status(
                SourceKind::Search,
                status,
                retry_after_secs(response.headers()),
                "custom search",
            ));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            ConnectorError::unavailable(
                SourceKind::Search,
                format!("search response parse error: {e}"),
            )
        })?;

        Ok(body
            .items
            .into_iter()
            .filter_map(|item| {
                let link = item.link.filter(|l| l.starts_with("http"))?;
                Some(SearchHit {
                    link,
                    title: item.title,
                })
            })
            .collect())
    }

    /// Collect up to `max_results` unique links across query variants.
    async fn collect_hits(&self, brand: &BrandQuery) -> Result<Vec<SearchHit>, ConnectorError> {
        let max_results = self.settings.max_results;
        let mut hits = Vec::new();
        let mut seen = HashSet::new();

        'queries: for query in build_query_variants(brand) {
            let mut start = 1;
            while start <= MAX_START {
                let page = match self.search_page(&query, start).await {
                    Ok(page) => page,
                    Err(e) if hits.is_empty() => return Err(e),
                    Err(e) => {
                        tracing::warn!(
                            brand = %brand.slug(),
                            source = "search",
                            error = %e,
                            "search paging stopped early"
                        );
                        break 'queries;
                    }
                };
                if page.is_empty() {
                    break;
                }
                for hit in page {
                    if seen.insert(canonical_locator(&hit.link)) {
                        hits.push(hit);
                    }
                    if hits.len() >= max_results {
                        break 'queries;
                    }
                }
                start += PAGE_SIZE;
            }
        }

        Ok(hits)
    }

    async fn fetch_page(&self, brand_slug: &str, hit: SearchHit) -> Option<SourceDocument> {
        let response = match self
            .client
            .get(&hit.link)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::debug!(
                    brand = brand_slug,
                    url = %hit.link,
                    status = %resp.status(),
                    "skipping page with non-success status"
                );
                return None;
            }
            Err(e) => {
                tracing::debug!(
                    brand = brand_slug,
                    url = %hit.link,
                    error = %e,
                    "page fetch failed"
                );
                return None;
            }
        };

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(
                    brand = brand_slug,
                    url = %hit.link,
                    error = %e,
                    "page body unreadable"
                );
                return None;
            }
        };

        let text = extract_main_text(&html);
        if text.chars().count() < MIN_PAGE_CHARS {
            tracing::debug!(brand = brand_slug, url = %hit.link, "page text too short");
            return None;
        }
        Some(SourceDocument::new(SourceKind::Search, hit.link, hit.title, &text))
    }

    async fn fetch_documents(
        &self,
        brand: &BrandQuery,
    ) -> Result<Vec<SourceDocument>, ConnectorError> {
        let slug = brand.slug();
        let hits = self.collect_hits(brand).await?;
        let candidates = hits.len();

        let documents: Vec<SourceDocument> = stream::iter(hits)
            .map(|hit| self.fetch_page(&slug, hit))
            .buffered(PAGE_FETCH_CONCURRENCY)
            .filter_map(|doc| async move { doc })
            .collect()
            .await;

        tracing::debug!(
            brand = %slug,
            candidates,
            kept = documents.len(),
            "search pages extracted"
        );
        Ok(documents)
    }
}

impl Connector for SearchConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Search
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

/// Quoted brand name, quoted aliases, then one `site:` query per domain.
fn build_query_variants(brand: &BrandQuery) -> Vec<String> {
    let mut variants: Vec<String> = brand.terms().iter().map(|t| format!("\"{t}\"")).collect();
    variants.extend(brand.domains().iter().map(|d| format!("site:{d}")));

    let mut seen = HashSet::new();
    variants.retain(|q| seen.insert(q.to_lowercase()));
    variants
}
