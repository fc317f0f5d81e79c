//! Reddit discussion connector (client-credentials OAuth, or the public listing).

use std::collections::HashSet;
use std::time::Duration;

use futures::{future::BoxFuture, FutureExt};
use jungai_core::{BrandQuery, SourceKind, SourceSettings};
use serde::Deserialize;

use crate::connector::Connector;
use crate::error::ConnectorError;
use crate::types::SourceDocument;

use super::reddit_helpers::{build_brand_terms, build_query_variants, mentions_brand, to_document};
use super::retry_after_secs;

const DEFAULT_OAUTH_BASE: &str = "https://oauth.reddit.com";
const DEFAULT_PUBLIC_BASE: &str = "https://www.reddit.com";
/// Listing page-size ceiling.
const PAGE_LIMIT: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit search listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Post {
    pub(super) data: PostData,
}

#[derive(Debug, Deserialize)]
pub(super) struct PostData {
    pub(super) title: Option<String>,
    pub(super) selftext: Option<String>,
    pub(super) permalink: Option<String>,
}

#[derive(Debug, Clone)]
struct Credentials {
    client_id: String,
    client_secret: String,
}

/// Searches Reddit posts that mention a brand.
pub struct DiscussionConnector {
    client: reqwest::Client,
    credentials: Option<Credentials>,
    user_agent: String,
    oauth_base: String,
    public_base: String,
    settings: SourceSettings,
}

impl DiscussionConnector {
    /// Unauthenticated connector using the public `search.json` listing.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SourceUnavailable`] if the HTTP client
    /// cannot be built.
    pub fn new(
        user_agent: impl Into<String>,
        settings: SourceSettings,
    ) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConnectorError::http(SourceKind::Discussion, &e))?;
        Ok(Self {
            client,
            credentials: None,
            user_agent: user_agent.into(),
            oauth_base: DEFAULT_OAUTH_BASE.to_string(),
            public_base: DEFAULT_PUBLIC_BASE.to_string(),
            settings,
        })
    }

    /// Exchange these client credentials for a token on every fetch.
    #[must_use]
    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        });
        self
    }

    /// Override both endpoints (used by tests).
    #[must_use]
    pub fn with_base_urls(
        mut self,
        oauth_base: impl Into<String>,
        public_base: impl Into<String>,
    ) -> Self {
        self.oauth_base = oauth_base.into();
        self.public_base = public_base.into();
        self
    }

    async fn fetch_token(&self, credentials: &Credentials) -> Result<String, ConnectorError> {
        let response = self
            .client
            .post(format!("{}/api/v1/access_token", self.public_base))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ConnectorError::http(SourceKind::Discussion, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::from_status(
                SourceKind::Discussion,
                status,
                retry_after_secs(response.headers()),
                "token exchange",
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ConnectorError::unavailable(SourceKind::Discussion, format!("token parse error: {e}"))
        })?;
        Ok(token.access_token)
    }

    async fn search(&self, query: &str, token: Option<&str>) -> Result<Vec<Post>, ConnectorError> {
        let limit = self.settings.max_results.min(PAGE_LIMIT).to_string();
        let params = [
            ("q", query),
            ("limit", limit.as_str()),
            ("sort", "relevance"),
            ("t", "all"),
            ("type", "link"),
            ("raw_json", "1"),
        ];

        let request = match token {
            Some(token) => self
                .client
                .get(format!("{}/search", self.oauth_base))
                .bearer_auth(token),
            None => self.client.get(format!("{}/search.json", self.public_base)),
        };

        let response = request
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&params)
            .send()
            .await
            .map_err(|e| ConnectorError::http(SourceKind::Discussion, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::from_status(
                SourceKind::Discussion,
                status,
                retry_after_secs(response.headers()),
                "discussion search",
            ));
        }

        let listing: Listing = response.json().await.map_err(|e| {
            ConnectorError::unavailable(SourceKind::Discussion, format!("listing parse error: {e}"))
        })?;
        Ok(listing.data.children)
    }

    /// Search with every query variant until `max_results` posts that
    /// mention the brand are collected.
    async fn fetch_documents(
        &self,
        brand: &BrandQuery,
    ) -> Result<Vec<SourceDocument>, ConnectorError> {
        let slug = brand.slug();
        let token = match &self.credentials {
            Some(credentials) => Some(self.fetch_token(credentials).await?),
            None => None,
        };

        let max_results = self.settings.max_results;
        let terms = build_brand_terms(brand);
        let queries = build_query_variants(brand);
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for query in &queries {
            let posts = match self.search(query, token.as_deref()).await {
                Ok(posts) => posts,
                Err(e) if documents.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        brand = %slug,
                        source = "reddit",
                        error = %e,
                        "search stopped early"
                    );
                    break;
                }
            };

            for post in &posts {
                let Some(document) = to_document(post) else {
                    continue;
                };
                if !mentions_brand(document.text(), &terms) {
                    continue;
                }
                if seen.insert(document.locator().to_string()) {
                    documents.push(document);
                }
                if documents.len() >= max_results {
                    break;
                }
            }
            if documents.len() >= max_results {
                break;
            }
        }

        tracing::debug!(
            brand = %slug,
            query_variants = queries.len(),
            authenticated = token.is_some(),
            documents = documents.len(),
            "collected Reddit posts"
        );
        Ok(documents)
    }
}

impl Connector for DiscussionConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Discussion
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
