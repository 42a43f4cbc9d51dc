//! Documentation enrichment
//!
//! Offline batch job: fetch each documentation reference, have a model
//! describe it, and mint a new versioned artifact carrying the results.

mod engine;
mod error;
mod fetch;

pub use engine::{
    DEFAULT_DOCUMENT_TIMEOUT, EnrichOptions, Enricher, EnrichmentFailure, EnrichmentReport, Vocabulary, parse_enrichment,
};
pub use error::{DocumentError, EnrichError};
pub use fetch::{DocumentFetcher, HttpFileFetcher, MAX_DOCUMENT_CHARS, truncate_document};
