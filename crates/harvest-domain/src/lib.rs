//! Harvest Domain Layer
//!
//! This crate contains the domain model of the full-text harvest and the
//! pure parts of the extraction pipeline. It performs no I/O: the source
//! reader and both sinks live in other crates behind the traits defined in
//! [`traits`].
//!
//! ## Key Concepts
//!
//! - **Publication**: a job entry naming a domain plus its descriptive fields
//! - **FulltextMetadata**: provenance of one distinct full-text body
//! - **Canonical text set**: de-duplicated, non-empty text variants of a body
//! - **Token record**: a token tagged with sequence and paragraph numbers
//! - **Assigned identifier**: the run-scoped, strictly increasing record id
//!
//! ## Pipeline
//!
//! ```text
//! Publication → FulltextSource → dedupe → { tokenize_text, IdAllocator } → sinks
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dedupe;
pub mod error;
pub mod fulltext;
pub mod identifier;
pub mod publication;
pub mod record;
pub mod tokenizer;
pub mod traits;

// Re-exports for convenience
pub use dedupe::{dedupe_metadata, dedupe_texts};
pub use error::{DomainError, SourceError};
pub use fulltext::{empty_content_hash, normalize_timestamp, timestamp_instant, FulltextMetadata};
pub use identifier::{AssignedId, IdAllocation, IdAllocator, DEFAULT_ASSIGNED_ID};
pub use publication::Publication;
pub use record::{OutputRecord, RowStoreRecord};
pub use tokenizer::{tokenize_text, TokenRecord, Tokenizer, WordTokenizer};
