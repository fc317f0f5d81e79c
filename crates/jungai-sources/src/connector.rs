use futures::future::BoxFuture;
use jungai_core::{BrandQuery, SourceKind, SourceSettings};

use crate::error::ConnectorError;
use crate::types::SourceDocument;

/// A provider of brand text.
///
/// Implementations own their HTTP client and credentials. A connector never
/// retries internally beyond skipping individual failed items; the aggregator
/// decides what a failure means for the run.
pub trait Connector: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Result cap, per-call timeout, and merge priority.
    fn settings(&self) -> &SourceSettings;

    /// Fetch documents for `brand`, in the provider's own relevance order.
    fn fetch<'a>(
        &'a self,
        brand: &'a BrandQuery,
    ) -> BoxFuture<'a, Result<Vec<SourceDocument>, ConnectorError>>;
}
