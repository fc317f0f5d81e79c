//! The classification attempt: prompt, request, parse, one strict retry.

use std::collections::BTreeMap;

use jungai_core::{AppConfig, Archetype, TruncationPolicy};
use jungai_sources::AggregatedCorpus;
use serde::Serialize;

use crate::error::ClassifierError;
use crate::generator::TextGenerator;
use crate::lexicon::evidence;
use crate::parse::{parse_reply, parse_strict_reply, ParsedReply};
use crate::prompt::build_prompts;

/// Progress of one classification attempt.
///
/// `Requested` records whether it is the strict retry, so a second retry
/// cannot be expressed: an unreadable reply to the retry always fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    Requested { retry: bool },
    RetryRequested,
    Parsed,
    Failed,
}

/// What happened since the last state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEvent {
    Sent,
    Parsed,
    Unparseable,
    Unavailable,
}

impl AttemptState {
    /// Apply `event`, or `None` when it cannot happen in this state.
    #[must_use]
    pub fn next(self, event: AttemptEvent) -> Option<Self> {
        match (self, event) {
            (Self::Pending, AttemptEvent::Sent) => Some(Self::Requested { retry: false }),
            (Self::RetryRequested, AttemptEvent::Sent) => Some(Self::Requested { retry: true }),
            (Self::Requested { .. }, AttemptEvent::Parsed) => Some(Self::Parsed),
            (Self::Requested { retry: false }, AttemptEvent::Unparseable) => {
                Some(Self::RetryRequested)
            }
            (Self::Requested { retry: true }, AttemptEvent::Unparseable)
            | (Self::Requested { .. }, AttemptEvent::Unavailable) => Some(Self::Failed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Parsed | Self::Failed)
    }
}

/// Identifies the corpus a verdict was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusRef {
    pub brand: String,
    pub document_count: usize,
    pub total_chars: usize,
    pub fingerprint: String,
}

impl CorpusRef {
    #[must_use]
    pub fn of(corpus: &AggregatedCorpus) -> Self {
        Self {
            brand: corpus.brand().name().to_string(),
            document_count: corpus.entries().len(),
            total_chars: corpus.total_chars(),
            fingerprint: corpus.fingerprint(),
        }
    }
}

/// The classifier's answer for one corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeVerdict {
    archetype: Archetype,
    justification: String,
    model: String,
    attempts: u32,
    patterns_found: Vec<String>,
    patterns_missing: Vec<String>,
    patterns_found_all: BTreeMap<String, Vec<String>>,
    suggestions: Vec<String>,
    corpus: CorpusRef,
}

impl ArchetypeVerdict {
    #[must_use]
    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    #[must_use]
    pub fn justification(&self) -> &str {
        &self.justification
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model requests used: 1, or 2 after a strict retry.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn patterns_found(&self) -> &[String] {
        &self.patterns_found
    }

    /// Label keywords the corpus never uses.
    #[must_use]
    pub fn patterns_missing(&self) -> &[String] {
        &self.patterns_missing
    }

    #[must_use]
    pub fn patterns_found_all(&self) -> &BTreeMap<String, Vec<String>> {
        &self.patterns_found_all
    }

    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    #[must_use]
    pub fn corpus(&self) -> &CorpusRef {
        &self.corpus
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifierOptions {
    pub max_input_tokens: usize,
    pub policy: TruncationPolicy,
}

impl ClassifierOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_input_tokens: config.model_max_input_tokens,
            policy: config.truncation_policy,
        }
    }
}

/// Classifies corpora with a [`TextGenerator`].
pub struct Classifier<G> {
    generator: G,
    options: ClassifierOptions,
}

impl<G: TextGenerator> Classifier<G> {
    pub fn new(generator: G, options: ClassifierOptions) -> Self {
        Self { generator, options }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    /// Classify `corpus` into one archetype.
    ///
    /// Sends one request; if the reply cannot be read, sends exactly one
    /// stricter retry.
    ///
    /// # Errors
    ///
    /// - [`ClassifierError::ModelUnavailable`] on transport or service
    ///   failure (never retried here).
    /// - [`ClassifierError::ClassificationParse`] when the retry reply is
    ///   also unreadable.
    /// - [`ClassifierError::InputBudget`] when the model input limit leaves
    ///   no room for corpus text; nothing is sent.
    pub async fn classify(
        &self,
        corpus: &AggregatedCorpus,
    ) -> Result<ArchetypeVerdict, ClassifierError> {
        let slug = corpus.brand().slug();
        let prompts = build_prompts(corpus, self.options.max_input_tokens, self.options.policy)?;
        tracing::debug!(
            brand = %slug,
            corpus_chars = corpus.total_chars(),
            prompt_corpus_chars = prompts.corpus_chars,
            "classification prompt built"
        );

        let mut state = AttemptState::Pending;
        let mut attempts = 0u32;
        let mut last_failure = (String::new(), String::new());

        while !state.is_terminal() {
            match state {
                AttemptState::Pending | AttemptState::RetryRequested => {
                    state = advance(state, AttemptEvent::Sent);
                }
                AttemptState::Requested { retry } => {
                    attempts += 1;
                    let request = if retry { &prompts.strict } else { &prompts.initial };
                    let reply = match self.generator.generate(request).await {
                        Ok(reply) => reply,
                        Err(e) => {
                            tracing::warn!(
                                brand = %slug,
                                attempt = attempts,
                                error = %e,
                                "model request failed"
                            );
                            return Err(e);
                        }
                    };

                    let parsed = if retry {
                        parse_strict_reply(&reply)
                    } else {
                        parse_reply(&reply)
                    };
                    match parsed {
                        Ok(parsed) => {
                            tracing::info!(
                                brand = %slug,
                                archetype = %parsed.archetype,
                                attempts,
                                "brand classified"
                            );
                            return Ok(self.verdict(corpus, parsed, attempts));
                        }
                        Err(reason) => {
                            tracing::warn!(
                                brand = %slug,
                                attempt = attempts,
                                reason = %reason,
                                "model reply did not name one archetype"
                            );
                            last_failure = (reason, reply);
                            state = advance(state, AttemptEvent::Unparseable);
                        }
                    }
                }
                AttemptState::Parsed | AttemptState::Failed => {}
            }
        }

        let (reason, response) = last_failure;
        Err(ClassifierError::ClassificationParse { reason, response })
    }

    fn verdict(
        &self,
        corpus: &AggregatedCorpus,
        parsed: ParsedReply,
        attempts: u32,
    ) -> ArchetypeVerdict {
        let text: Vec<&str> = corpus.entries().iter().map(|e| e.excerpt()).collect();
        let evidence = evidence(parsed.archetype, &text.join("\n"));
        ArchetypeVerdict {
            archetype: parsed.archetype,
            justification: parsed.justification,
            model: self.generator.model().to_string(),
            attempts,
            patterns_found: evidence.found,
            patterns_missing: evidence.missing,
            patterns_found_all: evidence.found_all,
            suggestions: evidence.suggestions,
            corpus: CorpusRef::of(corpus),
        }
    }
}

fn advance(state: AttemptState, event: AttemptEvent) -> AttemptState {
    state.next(event).unwrap_or(AttemptState::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let s = AttemptState::Pending.next(AttemptEvent::Sent).expect("send");
        assert_eq!(s, AttemptState::Requested { retry: false });
        assert_eq!(s.next(AttemptEvent::Parsed), Some(AttemptState::Parsed));
    }

    #[test]
    fn at_most_one_retry() {
        let s = AttemptState::Pending
            .next(AttemptEvent::Sent)
            .and_then(|s| s.next(AttemptEvent::Unparseable))
            .expect("retry requested");
        assert_eq!(s, AttemptState::RetryRequested);
        let s = s.next(AttemptEvent::Sent).expect("resend");
        assert_eq!(s, AttemptState::Requested { retry: true });
        assert_eq!(s.next(AttemptEvent::Unparseable), Some(AttemptState::Failed));
    }

    #[test]
    fn unavailable_fails_without_retry() {
        let s = AttemptState::Requested { retry: false };
        assert_eq!(s.next(AttemptEvent::Unavailable), Some(AttemptState::Failed));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        assert_eq!(AttemptState::Pending.next(AttemptEvent::Parsed), None);
        assert_eq!(AttemptState::RetryRequested.next(AttemptEvent::Unparseable), None);
        assert_eq!(AttemptState::Parsed.next(AttemptEvent::Sent), None);
        assert_eq!(AttemptState::Failed.next(AttemptEvent::Sent), None);
        assert!(AttemptState::Parsed.is_terminal());
        assert!(!AttemptState::RetryRequested.is_terminal());
    }
}
