//! The `analyze` command: resolve brands, run the batch, print a summary.

mod runner;

use jungai_classifier::{Classifier, ClassifierOptions, OpenAiClient};
use jungai_core::{load_brands, AppConfig, BrandQuery, BrandsFile};
use jungai_report::ReportWriter;
use jungai_sources::{connectors_from_config, Aggregator, AggregatorOptions};
use uuid::Uuid;

use self::runner::{BatchSummary, Pipeline};

/// Turn `--brand` values into queries.
///
/// With no values, every configured brand runs. A value matching a configured
/// brand by slug picks up its aliases and domains; any other value runs with
/// the bare name.
pub(crate) fn resolve_brands(
    requested: &[String],
    configured: Option<&BrandsFile>,
) -> anyhow::Result<Vec<BrandQuery>> {
    if requested.is_empty() {
        let Some(file) = configured else {
            anyhow::bail!("no --brand given and no brands file could be loaded");
        };
        return Ok(file.brands.iter().map(BrandQuery::from).collect());
    }

    let mut brands: Vec<BrandQuery> = Vec::with_capacity(requested.len());
    for name in requested {
        let query = configured
            .and_then(|file| file.find(name))
            .map_or_else(|| BrandQuery::new(name.as_str()), BrandQuery::from);
        if query.name().is_empty() {
            anyhow::bail!("brand name must be non-empty");
        }
        if brands.iter().any(|b| b.slug() == query.slug()) {
            tracing::warn!(brand = %query.slug(), "duplicate --brand value ignored");
            continue;
        }
        brands.push(query);
    }
    Ok(brands)
}

pub(crate) fn build_classifier(config: &AppConfig) -> anyhow::Result<Classifier<OpenAiClient>> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        anyhow::bail!("OPENAI_API_KEY is required to classify brands");
    };
    let client = OpenAiClient::with_base_url(
        api_key,
        &config.model,
        config.model_timeout_secs,
        &config.model_base_url,
    )?;
    Ok(Classifier::new(client, ClassifierOptions::from_config(config)))
}

/// Run the batch for the requested brands.
///
/// # Errors
///
/// Returns an error if brands cannot be resolved, the classifier cannot be
/// built, or `strict` is set and any brand ended without data or without a
/// written report.
pub(crate) async fn run_analyze(
    config: &AppConfig,
    requested: &[String],
    strict: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let configured = match load_brands(&config.brands_path) {
        Ok(file) => Some(file),
        Err(e) if !requested.is_empty() => {
            tracing::debug!(error = %e, "brands file not loaded; using --brand values as given");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let brands = resolve_brands(requested, configured.as_ref())?;
    if brands.is_empty() {
        println!("no brands to analyze");
        return Ok(());
    }

    let connectors = connectors_from_config(config);
    if dry_run {
        let names: Vec<&str> = brands.iter().map(BrandQuery::name).collect();
        let sources: Vec<String> = connectors.iter().map(|c| c.kind().to_string()).collect();
        println!(
            "dry-run: would analyze {} brands: [{}] using sources [{}] and model {}",
            brands.len(),
            names.join(", "),
            sources.join(", "),
            config.model
        );
        return Ok(());
    }

    let pipeline = Pipeline {
        aggregator: Aggregator::new(connectors, AggregatorOptions::from_config(config)),
        classifier: build_classifier(config)?,
        writer: ReportWriter::new(&config.report_path),
        max_retries: config.model_max_retries,
        backoff_base_ms: config.model_backoff_base_ms,
    };

    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, brands = brands.len(), "analysis run started");
    let results = pipeline
        .run_batch(run_id, &brands, config.max_concurrent_brands)
        .await;

    println!("{:<28}{:<12}{:<9}GAPS", "BRAND", "ARCHETYPE", "SOURCES");
    for (brand, outcome) in &results {
        match outcome {
            Ok(done) => println!(
                "{:<28}{:<12}{:<9}{}",
                brand,
                done.archetype.label(),
                done.sources,
                done.gaps
            ),
            Err(_) => println!("{brand:<28}{:<12}{:<9}-", "FAILED", "-"),
        }
    }

    let summary = BatchSummary::from_results(&results);
    println!();
    println!(
        "succeeded: {}, failed: {}",
        summary.succeeded,
        summary.failed.len()
    );
    for (brand, reason) in &summary.failed {
        println!("  {brand}: {reason}");
    }
    println!("reports: {}", config.report_path.display());

    if strict && summary.strict_failures > 0 {
        anyhow::bail!(
            "strict mode: {} brand(s) ended without data or without a written report",
            summary.strict_failures
        );
    }
    Ok(())
}
