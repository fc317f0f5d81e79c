//! Source collection and aggregation for the JungAI archetype pipeline.
//!
//! Connectors pull brand text from web search, video transcripts, and
//! discussion threads. The [`Aggregator`] runs them concurrently under a
//! worker limit and a global deadline, then merges what came back into one
//! ordered, de-duplicated, budgeted [`AggregatedCorpus`].

pub mod aggregator;
pub mod connector;
pub mod corpus;
pub mod error;
pub mod text;
pub mod truncate;
pub mod types;

mod sources;

pub use aggregator::{Aggregator, AggregatorOptions};
pub use connector::Connector;
pub use corpus::{merge_batches, AggregatedCorpus, ConnectorBatch, CorpusEntry};
pub use error::{AggregateError, ConnectorError};
pub use sources::{
    connectors_from_config, DiscussionConnector, SearchConnector, VideoTranscriptConnector,
};
pub use truncate::allocate_budget;
pub use types::{SourceDocument, SourceGap};
