//! The `classify` command: one verdict for text supplied on the command line.

use jungai_classifier::classify_with_backoff;
use jungai_core::{AppConfig, BrandQuery};
use jungai_sources::AggregatedCorpus;

use crate::analyze::build_classifier;

/// Classify `text` and print the verdict as JSON.
///
/// # Errors
///
/// Returns an error if the text is empty, no model key is configured, or
/// classification fails.
pub(crate) async fn run_classify(
    config: &AppConfig,
    brand: &str,
    text: &str,
) -> anyhow::Result<()> {
    let Some(corpus) = AggregatedCorpus::submitted(
        BrandQuery::new(brand),
        text,
        config.corpus_max_chars,
        config.truncation_policy,
    ) else {
        anyhow::bail!("nothing to classify: text is empty");
    };

    let classifier = build_classifier(config)?;
    let verdict = classify_with_backoff(
        &classifier,
        &corpus,
        config.model_max_retries,
        config.model_backoff_base_ms,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
