//! Per-brand pipeline and the concurrent batch loop.

use futures::stream::{self, StreamExt};
use jungai_classifier::{classify_with_backoff, Classifier, ClassifierError, TextGenerator};
use jungai_core::{Archetype, BrandQuery};
use jungai_report::{Report, ReportError, ReportWriter};
use jungai_sources::{AggregateError, Aggregator};
use uuid::Uuid;

/// Why one brand produced no report.
#[derive(Debug, thiserror::Error)]
pub(crate) enum BrandFailure {
    #[error(transparent)]
    NoData(#[from] AggregateError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl BrandFailure {
    /// Failures that make a strict run exit non-zero.
    pub(crate) fn fails_strict_run(&self) -> bool {
        matches!(
            self,
            Self::NoData(_) | Self::Report(ReportError::WriteFailed { .. })
        )
    }
}

/// What one brand run produced.
#[derive(Debug)]
pub(crate) struct BrandSuccess {
    pub archetype: Archetype,
    pub sources: usize,
    pub gaps: usize,
}

/// Everything a batch needs, built once and shared by reference.
pub(crate) struct Pipeline<G> {
    pub aggregator: Aggregator,
    pub classifier: Classifier<G>,
    pub writer: ReportWriter,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl<G: TextGenerator> Pipeline<G> {
    /// Collect, classify, and emit one brand's report.
    pub(crate) async fn run_brand(
        &self,
        run_id: Uuid,
        brand: &BrandQuery,
    ) -> Result<BrandSuccess, BrandFailure> {
        let corpus = self.aggregator.collect(brand).await?;
        let verdict = classify_with_backoff(
            &self.classifier,
            &corpus,
            self.max_retries,
            self.backoff_base_ms,
        )
        .await?;
        let report = Report::new(run_id, &corpus, &verdict);
        self.writer.emit(&report).await?;
        Ok(BrandSuccess {
            archetype: verdict.archetype(),
            sources: report.sources.len(),
            gaps: report.source_gaps.len(),
        })
    }

    /// Run every brand, up to `max_concurrent` at once.
    ///
    /// A failed brand never stops its siblings. Results come back in input
    /// order.
    pub(crate) async fn run_batch(
        &self,
        run_id: Uuid,
        brands: &[BrandQuery],
        max_concurrent: usize,
    ) -> Vec<(String, Result<BrandSuccess, BrandFailure>)> {
        let mut results: Vec<(usize, String, Result<BrandSuccess, BrandFailure>)> =
            stream::iter(brands.iter().enumerate())
                .map(|(index, brand)| async move {
                    let outcome = self.run_brand(run_id, brand).await;
                    if let Err(e) = &outcome {
                        tracing::error!(brand = %brand.slug(), error = %e, "brand run failed");
                    }
                    (index, brand.name().to_string(), outcome)
                })
                .buffer_unordered(max_concurrent.max(1))
                .collect()
                .await;
        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, name, outcome)| (name, outcome))
            .collect()
    }
}

/// Counts and failure reasons for a finished batch.
#[derive(Debug, Default)]
pub(crate) struct BatchSummary {
    pub succeeded: usize,
    pub failed: Vec<(String, String)>,
    pub strict_failures: usize,
}

impl BatchSummary {
    pub(crate) fn from_results(results: &[(String, Result<BrandSuccess, BrandFailure>)]) -> Self {
        let mut summary = Self::default();
        for (brand, outcome) in results {
            match outcome {
                Ok(_) => summary.succeeded += 1,
                Err(failure) => {
                    if failure.fails_strict_run() {
                        summary.strict_failures += 1;
                    }
                    summary.failed.push((brand.clone(), failure.to_string()));
                }
            }
        }
        summary
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
