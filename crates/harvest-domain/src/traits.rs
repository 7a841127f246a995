//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! infrastructure. Implementations live in other crates.

use crate::error::SourceError;
use crate::fulltext::FulltextMetadata;
use crate::record::RowStoreRecord;
use crate::tokenizer::TokenRecord;
use std::path::PathBuf;

/// Read access to the archival store
///
/// Implemented by the infrastructure layer (harvest-source)
pub trait FulltextSource {
    /// Distinct provenance metadata for a domain
    ///
    /// One entry per distinct content hash, keeping the earliest-timestamped
    /// origin. Rows with a null, empty or no-content hash are excluded.
    fn fetch_metadata(&mut self, domain: &str) -> Result<Vec<FulltextMetadata>, SourceError>;

    /// Every raw text value stored for a content hash, in natural row order
    fn fetch_texts(&mut self, content_hash: &str) -> Result<Vec<String>, SourceError>;

    /// Release the source at the end of a run
    fn close(self) -> Result<(), SourceError>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Row-oriented sink holding descriptors, tokens and metadata
///
/// Implemented by the infrastructure layer (harvest-store)
pub trait RowStore {
    /// Error type for store operations
    type Error: std::fmt::Display;

    /// Insert one metadata row and its tokens atomically
    ///
    /// Either the descriptor row, the metadata row and every token row
    /// become visible, or none of them do.
    fn insert_record(
        &mut self,
        record: &RowStoreRecord,
        tokens: &[TokenRecord],
    ) -> Result<(), Self::Error>;

    /// Close the store for the run and return its final location
    fn finalize(self) -> Result<PathBuf, Self::Error>
    where
        Self: Sized;
}
