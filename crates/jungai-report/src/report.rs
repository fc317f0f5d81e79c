//! The report record: one line of the output file.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use jungai_classifier::ArchetypeVerdict;
use jungai_core::{Archetype, SourceKind};
use jungai_sources::{AggregatedCorpus, SourceGap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provenance for one document that fed the classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub locator: String,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default)]
    pub excerpt: String,
}

/// A brand's verdict with the provenance it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub run_id: Uuid,
    pub brand: String,
    pub archetype: Archetype,
    pub justification: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub patterns_found: Vec<String>,
    #[serde(default)]
    pub patterns_missing: Vec<String>,
    #[serde(default)]
    pub patterns_found_all: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub sources: Vec<ReportSource>,
    #[serde(default)]
    pub source_gaps: Vec<SourceGap>,
    #[serde(default)]
    pub corpus_fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Assemble a report from a corpus and the verdict computed from it.
    #[must_use]
    pub fn new(run_id: Uuid, corpus: &AggregatedCorpus, verdict: &ArchetypeVerdict) -> Self {
        let sources = corpus
            .entries()
            .iter()
            .map(|entry| {
                let doc = entry.document();
                ReportSource {
                    kind: doc.kind(),
                    locator: doc.locator().to_string(),
                    retrieved_at: doc.retrieved_at(),
                    excerpt: entry.excerpt().to_string(),
                }
            })
            .collect();

        Self {
            run_id,
            brand: corpus.brand().name().to_string(),
            archetype: verdict.archetype(),
            justification: verdict.justification().to_string(),
            model: verdict.model().to_string(),
            patterns_found: verdict.patterns_found().to_vec(),
            patterns_missing: verdict.patterns_missing().to_vec(),
            patterns_found_all: verdict.patterns_found_all().clone(),
            suggestions: verdict.suggestions().to_vec(),
            sources,
            source_gaps: corpus.gaps().to_vec(),
            corpus_fingerprint: verdict.corpus().fingerprint.clone(),
            generated_at: Utc::now(),
        }
    }
}
