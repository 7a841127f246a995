//! Error types shared across the harvest crates

use thiserror::Error;

/// Errors raised by domain validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The job entry lacks the responsible-editor flag, or it is false
    #[error("No responsible editor for domain '{0}'")]
    MissingResponsibleEditor(String),

    /// A required job entry field is empty
    #[error("Missing required field '{field}' in job entry")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// The domain already appeared earlier in the same run
    #[error("Duplicate domain '{0}' in job configuration")]
    DuplicateDomain(String),
}

/// Errors raised by a [`FulltextSource`](crate::traits::FulltextSource)
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport or query failure reported by the archival store
    #[error("Source query failed: {0}")]
    Query(String),

    /// A returned row did not have the expected number of columns
    #[error("Schema violation in {query}: expected {expected} columns, got {got}")]
    SchemaViolation {
        /// Which query produced the row
        query: &'static str,
        /// Number of columns the contract requires
        expected: usize,
        /// Number of columns actually returned
        got: usize,
    },

    /// A column held a value that could not be interpreted
    #[error("Malformed value: {0}")]
    MalformedValue(String),
}

impl SourceError {
    /// Whether this error breaks the source contract for the whole run
    ///
    /// Schema violations abort the run; every other source error only fails
    /// the domain being processed.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, SourceError::SchemaViolation { .. })
    }
}
