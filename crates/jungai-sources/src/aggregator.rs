//! Concurrent connector fan-out for one brand.

use std::time::Duration;

use futures::{stream, StreamExt};
use jungai_core::{AppConfig, BrandQuery, TruncationPolicy};

use crate::connector::Connector;
use crate::corpus::{merge_batches, AggregatedCorpus, ConnectorBatch};
use crate::error::AggregateError;
use crate::types::SourceGap;

/// Limits applied to one collection run.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorOptions {
    /// Connectors allowed in flight at once.
    pub worker_limit: usize,
    /// Deadline for the whole fan-out.
    pub total_timeout: Duration,
    /// Corpus character budget.
    pub max_chars: usize,
    pub policy: TruncationPolicy,
}

impl AggregatorOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            worker_limit: config.connector_workers,
            total_timeout: Duration::from_secs(config.collect_timeout_secs),
            max_chars: config.corpus_max_chars,
            policy: config.truncation_policy,
        }
    }
}

/// Runs every configured connector for a brand and merges the results.
pub struct Aggregator {
    connectors: Vec<Box<dyn Connector>>,
    options: AggregatorOptions,
}

enum Outcome {
    Documents(ConnectorBatch),
    Gap(SourceGap),
}

impl Aggregator {
    #[must_use]
    pub fn new(connectors: Vec<Box<dyn Connector>>, options: AggregatorOptions) -> Self {
        Self {
            connectors,
            options,
        }
    }

    /// Collect a corpus for `brand`.
    ///
    /// Connectors run under the worker limit, each inside its own timeout.
    /// When the global deadline passes, in-flight fetches are dropped and
    /// recorded as timed-out gaps. Failed connectors become gaps; they never
    /// stop their siblings.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::NoDataAvailable`] when no connector
    /// produced usable text.
    pub async fn collect(&self, brand: &BrandQuery) -> Result<AggregatedCorpus, AggregateError> {
        let slug = brand.slug();
        let deadline = tokio::time::Instant::now() + self.options.total_timeout;
        let mut finished = vec![false; self.connectors.len()];
        let mut batches = Vec::new();
        let mut gaps: Vec<(usize, SourceGap)> = Vec::new();

        {
            let mut in_flight = stream::iter(self.connectors.iter().enumerate())
                .map(|(slot, connector)| async move {
                    (slot, run_connector(slot, connector.as_ref(), brand).await)
                })
                .buffer_unordered(self.options.worker_limit.max(1));

            loop {
                match tokio::time::timeout_at(deadline, in_flight.next()).await {
                    Ok(Some((slot, outcome))) => {
                        finished[slot] = true;
                        match outcome {
                            Outcome::Documents(batch) => batches.push(batch),
                            Outcome::Gap(gap) => gaps.push((slot, gap)),
                        }
                    }
                    Ok(None) => break,
                    Err(_) => {
                        tracing::warn!(
                            brand = %slug,
                            timeout_secs = self.options.total_timeout.as_secs(),
                            "collection deadline reached; cancelling remaining connectors"
                        );
                        break;
                    }
                }
            }
        }

        for (slot, connector) in self.connectors.iter().enumerate() {
            if !finished[slot] {
                gaps.push((
                    slot,
                    SourceGap {
                        kind: connector.kind(),
                        reason: "timed out".to_string(),
                    },
                ));
            }
        }
        gaps.sort_by_key(|(slot, _)| *slot);
        let gaps: Vec<SourceGap> = gaps.into_iter().map(|(_, gap)| gap).collect();

        tracing::info!(
            brand = %slug,
            connectors = self.connectors.len(),
            contributed = batches.len(),
            gaps = gaps.len(),
            "collection finished"
        );

        let corpus = merge_batches(
            brand,
            batches,
            gaps,
            self.options.max_chars,
            self.options.policy,
        )?;
        tracing::info!(
            brand = %slug,
            documents = corpus.entries().len(),
            total_chars = corpus.total_chars(),
            truncated = corpus.is_truncated(),
            sources = ?corpus.source_kinds(),
            "corpus assembled"
        );
        Ok(corpus)
    }
}

async fn run_connector(slot: usize, connector: &dyn Connector, brand: &BrandQuery) -> Outcome {
    let kind = connector.kind();
    let settings = connector.settings();
    let timeout = Duration::from_secs(settings.timeout_secs);

    match tokio::time::timeout(timeout, connector.fetch(brand)).await {
        Ok(Ok(documents)) if documents.is_empty() => {
            tracing::info!(
                brand = %brand.slug(),
                source = %kind,
                "connector returned no documents"
            );
            Outcome::Gap(SourceGap {
                kind,
                reason: "no documents returned".to_string(),
            })
        }
        Ok(Ok(documents)) => {
            tracing::debug!(
                brand = %brand.slug(),
                source = %kind,
                count = documents.len(),
                "connector finished"
            );
            Outcome::Documents(ConnectorBatch {
                slot,
                priority: settings.priority,
                documents,
            })
        }
        Ok(Err(e)) => {
            tracing::warn!(brand = %brand.slug(), source = %kind, error = %e, "connector failed");
            Outcome::Gap(SourceGap {
                kind,
                reason: e.gap_reason(),
            })
        }
        Err(_) => {
            tracing::warn!(
                brand = %brand.slug(),
                source = %kind,
                timeout_secs = settings.timeout_secs,
                "connector timed out"
            );
            Outcome::Gap(SourceGap {
                kind,
                reason: "timed out".to_string(),
            })
        }
    }
}
