//! Corpus assembly: deterministic ordering, de-duplication, and budgeting.

use std::collections::HashSet;

use jungai_core::{BrandQuery, SourceKind, TruncationPolicy};
use reqwest::Url;
use sha2::{Digest, Sha256};

use crate::error::AggregateError;
use crate::text::{clip_chars, content_fingerprint};
use crate::truncate::allocate_budget;
use crate::types::{SourceDocument, SourceGap};

/// Documents returned by one connector call.
#[derive(Debug, Clone)]
pub struct ConnectorBatch {
    /// Position of the connector in the configured list; breaks priority ties.
    pub slot: usize,
    pub priority: u8,
    pub documents: Vec<SourceDocument>,
}

/// A document plus the part of its text that fit the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    document: SourceDocument,
    excerpt: String,
}

impl CorpusEntry {
    #[must_use]
    pub fn document(&self) -> &SourceDocument {
        &self.document
    }

    #[must_use]
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    #[must_use]
    pub fn excerpt_chars(&self) -> usize {
        self.excerpt.chars().count()
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.excerpt.len() < self.document.text().len()
    }
}

/// Ordered, budgeted text collected for one brand. Never empty.
#[derive(Debug, Clone)]
pub struct AggregatedCorpus {
    brand: BrandQuery,
    entries: Vec<CorpusEntry>,
    gaps: Vec<SourceGap>,
}

impl AggregatedCorpus {
    /// Budget already-ordered documents into a corpus.
    ///
    /// Returns `None` when no document keeps any text.
    #[must_use]
    pub fn from_documents(
        brand: BrandQuery,
        documents: Vec<SourceDocument>,
        gaps: Vec<SourceGap>,
        max_chars: usize,
        policy: TruncationPolicy,
    ) -> Option<Self> {
        let lengths: Vec<usize> = documents.iter().map(SourceDocument::char_count).collect();
        let allocation = allocate_budget(&lengths, max_chars, policy);

        let entries: Vec<CorpusEntry> = documents
            .into_iter()
            .zip(allocation)
            .filter(|(_, keep)| *keep > 0)
            .map(|(document, keep)| {
                let excerpt = clip_chars(document.text(), keep).to_string();
                CorpusEntry { document, excerpt }
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        Some(Self {
            brand,
            entries,
            gaps,
        })
    }

    /// A single-document corpus from text posted for classification.
    ///
    /// Returns `None` when the text is empty after normalization.
    #[must_use]
    pub fn submitted(
        brand: BrandQuery,
        text: &str,
        max_chars: usize,
        policy: TruncationPolicy,
    ) -> Option<Self> {
        let document = SourceDocument::submitted(text, max_chars);
        if document.text().is_empty() {
            return None;
        }
        Self::from_documents(brand, vec![document], Vec::new(), max_chars, policy)
    }

    #[must_use]
    pub fn brand(&self) -> &BrandQuery {
        &self.brand
    }

    #[must_use]
    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    #[must_use]
    pub fn gaps(&self) -> &[SourceGap] {
        &self.gaps
    }

    /// Total excerpt characters across all entries; never above the budget.
    #[must_use]
    pub fn total_chars(&self) -> usize {
        self.entries.iter().map(CorpusEntry::excerpt_chars).sum()
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.entries.iter().any(CorpusEntry::is_truncated)
    }

    /// Distinct source kinds present, in corpus order.
    #[must_use]
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.document.kind())
            .filter(|k| seen.insert(*k))
            .collect()
    }

    /// SHA-256 over entry kinds, locators, and excerpts, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.document.kind().as_str().as_bytes());
            hasher.update(b"\n");
            hasher.update(entry.document.locator().as_bytes());
            hasher.update(b"\n");
            hasher.update(entry.excerpt.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Merge connector batches into a corpus.
///
/// Batches are ordered by `(priority, slot)` so completion order never
/// matters; each batch keeps its own retrieval order. Documents repeating an
/// earlier `(kind, canonical locator)` or `(kind, content)` pair are dropped,
/// then the rest are fitted to `max_chars` with `policy`.
///
/// # Errors
///
/// Returns [`AggregateError::NoDataAvailable`] when nothing survives.
pub fn merge_batches(
    brand: &BrandQuery,
    mut batches: Vec<ConnectorBatch>,
    gaps: Vec<SourceGap>,
    max_chars: usize,
    policy: TruncationPolicy,
) -> Result<AggregatedCorpus, AggregateError> {
    batches.sort_by_key(|b| (b.priority, b.slot));

    let mut seen_locators: HashSet<(SourceKind, String)> = HashSet::new();
    let mut seen_content: HashSet<(SourceKind, String)> = HashSet::new();
    let mut documents = Vec::new();
    let mut duplicates = 0usize;

    for batch in batches {
        for document in batch.documents {
            if document.text().is_empty() {
                continue;
            }
            let kind = document.kind();
            let locator_key = (kind, canonical_locator(document.locator()));
            let content_key = (kind, content_fingerprint(document.text()));
            if seen_locators.contains(&locator_key) || seen_content.contains(&content_key) {
                duplicates += 1;
                continue;
            }
            seen_locators.insert(locator_key);
            seen_content.insert(content_key);
            documents.push(document);
        }
    }

    if duplicates > 0 {
        tracing::debug!(brand = %brand.slug(), duplicates, "dropped duplicate documents");
    }

    AggregatedCorpus::from_documents(brand.clone(), documents, gaps.clone(), max_chars, policy)
        .ok_or_else(|| AggregateError::NoDataAvailable {
            brand: brand.name().to_string(),
            gaps,
        })
}

/// Normalize a locator for duplicate detection.
///
/// Drops the fragment, `utm_*` parameters, a leading `www.`, and a trailing
/// slash; scheme and host are lower-cased by URL parsing. Non-URL locators
/// are trimmed and lower-cased.
#[must_use]
pub fn canonical_locator(locator: &str) -> String {
    let Ok(mut url) = Url::parse(locator.trim()) else {
        return locator.trim().to_lowercase();
    };

    url.set_fragment(None);

    if let Some(host) = url
        .host_str()
        .and_then(|h| h.strip_prefix("www."))
        .map(str::to_string)
    {
        // set_host only fails for cannot-be-a-base URLs, which have no host.
        let _ = url.set_host(Some(&host));
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let rendered = url.to_string();
    if url.query().is_none() {
        rendered.trim_end_matches('/').to_string()
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn doc(kind: SourceKind, locator: &str, text: &str) -> SourceDocument {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time");
        SourceDocument::retrieved(kind, locator, None, text, at)
    }

    fn batch(slot: usize, priority: u8, docs: Vec<SourceDocument>) -> ConnectorBatch {
        ConnectorBatch {
            slot,
            priority,
            documents: docs,
        }
    }

    fn brand() -> BrandQuery {
        BrandQuery::new("AcmeCorp")
    }

    #[test]
    fn submitted_text_becomes_a_single_entry() {
        let corpus = AggregatedCorpus::submitted(
            brand(),
            "  We   care for you. ",
            100,
            TruncationPolicy::Priority,
        )
        .expect("non-empty");
        assert_eq!(corpus.entries().len(), 1);
        assert_eq!(corpus.entries()[0].excerpt(), "We care for you.");
        assert_eq!(corpus.source_kinds(), vec![SourceKind::Submitted]);
        assert!(
            AggregatedCorpus::submitted(brand(), " \n ", 100, TruncationPolicy::Priority).is_none()
        );
    }

    #[test]
    fn long_submission_uses_the_whole_corpus_budget() {
        let text = "word ".repeat(2_000);
        let corpus =
            AggregatedCorpus::submitted(brand(), &text, 12_000, TruncationPolicy::Priority)
                .expect("non-empty");
        assert!(corpus.total_chars() > SourceDocument::MAX_CHARS);
        assert_eq!(corpus.total_chars(), 9_999);
        assert!(!corpus.is_truncated());

        let budgeted =
            AggregatedCorpus::submitted(brand(), &text, 6_000, TruncationPolicy::Balanced)
                .expect("non-empty");
        assert_eq!(budgeted.total_chars(), 6_000);
    }

    #[test]
    fn acme_scenario_keeps_priority_source_whole() {
        let search = doc(SourceKind::Search, "https://acme.example/about", &"s".repeat(200));
        let video = doc(
            SourceKind::VideoTranscript,
            "https://www.youtube.com/watch?v=acme1",
            &"v".repeat(300),
        );
        // Video arrives first; search still leads because of its priority.
        let batches = vec![batch(1, 2, vec![video]), batch(0, 1, vec![search])];

        let corpus = merge_batches(&brand(), batches, vec![], 400, TruncationPolicy::Priority)
            .expect("corpus");

        assert_eq!(corpus.entries().len(), 2);
        assert_eq!(corpus.entries()[0].document().kind(), SourceKind::Search);
        assert_eq!(corpus.entries()[0].excerpt_chars(), 200);
        assert!(!corpus.entries()[0].is_truncated());
        assert_eq!(corpus.entries()[1].excerpt_chars(), 200);
        assert!(corpus.entries()[1].is_truncated());
        assert!(corpus.is_truncated());
        assert!(corpus.total_chars() <= 400);
    }

    #[test]
    fn ordering_is_independent_of_arrival_order() {
        let make = || {
            vec![
                batch(2, 3, vec![doc(SourceKind::Discussion, "r/1", "reddit one")]),
                batch(
                    0,
                    1,
                    vec![
                        doc(SourceKind::Search, "https://a.example/1", "search one"),
                        doc(SourceKind::Search, "https://a.example/2", "search two"),
                    ],
                ),
                batch(1, 1, vec![doc(SourceKind::VideoTranscript, "yt/1", "video one")]),
            ]
        };

        let expected = vec!["search one", "search two", "video one", "reddit one"];
        for rotation in 0..3 {
            let mut batches = make();
            batches.rotate_left(rotation);
            let corpus =
                merge_batches(&brand(), batches, vec![], 10_000, TruncationPolicy::Priority)
                    .expect("corpus");
            let texts: Vec<&str> = corpus.entries().iter().map(CorpusEntry::excerpt).collect();
            assert_eq!(texts, expected, "rotation {rotation}");
            assert_eq!(
                corpus.source_kinds(),
                vec![
                    SourceKind::Search,
                    SourceKind::VideoTranscript,
                    SourceKind::Discussion
                ]
            );
        }
    }

    #[test]
    fn duplicate_locators_within_a_source_are_dropped() {
        let batches = vec![batch(
            0,
            1,
            vec![
                doc(
                    SourceKind::Search,
                    "https://www.Acme.example/about/?utm_source=x#top",
                    "first copy",
                ),
                doc(
                    SourceKind::Search,
                    "https://acme.example/about",
                    "second copy differs",
                ),
            ],
        )];
        let corpus = merge_batches(&brand(), batches, vec![], 1000, TruncationPolicy::Priority)
            .expect("corpus");
        assert_eq!(corpus.entries().len(), 1);
        assert_eq!(corpus.entries()[0].excerpt(), "first copy");
    }

    #[test]
    fn same_locator_from_different_sources_is_kept() {
        let batches = vec![
            batch(0, 1, vec![doc(SourceKind::Search, "https://x.example/a", "alpha")]),
            batch(1, 2, vec![doc(SourceKind::Discussion, "https://x.example/a", "beta")]),
        ];
        let corpus = merge_batches(&brand(), batches, vec![], 1000, TruncationPolicy::Priority)
            .expect("corpus");
        assert_eq!(corpus.entries().len(), 2);
    }

    #[test]
    fn identical_text_within_a_source_is_dropped() {
        let batches = vec![batch(
            0,
            3,
            vec![
                doc(SourceKind::Discussion, "https://reddit.com/r/a/1", "Same  post text"),
                doc(SourceKind::Discussion, "https://reddit.com/r/b/2", "same post text"),
            ],
        )];
        let corpus = merge_batches(&brand(), batches, vec![], 1000, TruncationPolicy::Priority)
            .expect("corpus");
        assert_eq!(corpus.entries().len(), 1);
    }

    #[test]
    fn empty_batches_yield_no_data_available_with_gaps() {
        let gaps = vec![SourceGap {
            kind: SourceKind::Search,
            reason: "source unavailable".to_string(),
        }];
        let err = merge_batches(
            &brand(),
            vec![batch(0, 1, vec![])],
            gaps,
            1000,
            TruncationPolicy::Priority,
        )
        .unwrap_err();
        let AggregateError::NoDataAvailable { brand, gaps } = err;
        assert_eq!(brand, "AcmeCorp");
        assert_eq!(gaps.len(), 1);
    }

    #[test]
    fn balanced_policy_respects_budget() {
        let batches = vec![
            batch(0, 1, vec![doc(SourceKind::Search, "a", &"a".repeat(200))]),
            batch(1, 2, vec![doc(SourceKind::VideoTranscript, "b", &"b".repeat(300))]),
        ];
        let corpus = merge_batches(&brand(), batches, vec![], 400, TruncationPolicy::Balanced)
            .expect("corpus");
        assert_eq!(corpus.total_chars(), 400);
        assert_eq!(corpus.entries()[0].excerpt_chars(), 200);
        assert_eq!(corpus.entries()[1].excerpt_chars(), 200);
    }

    #[test]
    fn fingerprint_is_stable_for_identical_input() {
        let build = || {
            merge_batches(
                &brand(),
                vec![batch(0, 1, vec![doc(SourceKind::Search, "a", "hello")])],
                vec![],
                100,
                TruncationPolicy::Priority,
            )
            .expect("corpus")
        };
        assert_eq!(build().fingerprint(), build().fingerprint());
        assert_eq!(build().fingerprint().len(), 64);
    }

    #[test]
    fn canonical_locator_normalizes_urls() {
        assert_eq!(
            canonical_locator("HTTPS://WWW.Example.com/Path/?utm_medium=a&id=7#frag"),
            "https://example.com/Path/?id=7"
        );
        assert_eq!(canonical_locator("https://example.com/a/"), "https://example.com/a");
        assert_eq!(canonical_locator("  Not A Url "), "not a url");
    }
}
