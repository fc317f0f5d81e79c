//! Caller-side back-off for transient model failures.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries
//! errors for which [`ClassifierError::is_transient`] holds. Parse failures
//! are returned immediately; the classifier already spent its one strict
//! retry on them.

use std::future::Future;
use std::time::Duration;

use jungai_sources::AggregatedCorpus;

use crate::classify::{ArchetypeVerdict, Classifier};
use crate::error::ClassifierError;
use crate::generator::TextGenerator;

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 60 s.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClassifierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifierError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "model unavailable; retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// [`Classifier::classify`] with back-off on transient model failures.
///
/// # Errors
///
/// Returns the last [`ClassifierError`] once retries are exhausted, or the
/// first non-transient one.
pub async fn classify_with_backoff<G: TextGenerator>(
    classifier: &Classifier<G>,
    corpus: &AggregatedCorpus,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Result<ArchetypeVerdict, ClassifierError> {
    retry_with_backoff(max_retries, backoff_base_ms, || classifier.classify(corpus)).await
}
