//! Archetype classification for aggregated brand corpora.
//!
//! Builds a budgeted prompt from an [`AggregatedCorpus`](jungai_sources::AggregatedCorpus),
//! asks a hosted chat model for one of the twelve archetype labels, parses
//! the reply (with one strict retry), and attaches keyword evidence.

pub mod classify;
pub mod client;
pub mod error;
pub mod generator;
pub mod lexicon;
pub mod parse;
pub mod prompt;
pub mod retry;

pub use classify::{
    ArchetypeVerdict, AttemptEvent, AttemptState, Classifier, ClassifierOptions, CorpusRef,
};
pub use client::OpenAiClient;
pub use error::ClassifierError;
pub use generator::{ChatRequest, TextGenerator};
pub use retry::{classify_with_backoff, retry_with_backoff};
