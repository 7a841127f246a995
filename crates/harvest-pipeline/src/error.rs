//! Error types for the pipeline

use harvest_domain::{AssignedId, DomainError, SourceError};
use thiserror::Error;

/// Errors that can occur while harvesting a domain
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Job entry failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    /// Archival store error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Record log could not be written or flushed
    #[error("Record log error: {0}")]
    RecordLog(#[from] std::io::Error),

    /// A failed append left bytes in the record log that could not be cut off
    #[error("Record log holds a partial entry ({cause}) that could not be removed: {rollback}")]
    TornRecordLog {
        /// Error that interrupted the append
        cause: String,
        /// Error that prevented truncating the log back
        rollback: String,
    },

    /// Every identifier of the run has been handed out
    #[error("Identifier counter exhausted")]
    IdentifiersExhausted,

    /// Record could not be serialized for the record log
    #[error("Record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row-store insert failed after the record log entry was made durable
    #[error("Row store write failed for record {assigned_id} (hash {content_hash}): {reason}")]
    SinkWrite {
        /// Identifier of the record present only in the record log
        assigned_id: AssignedId,
        /// Content hash of the record
        content_hash: String,
        /// Underlying store error
        reason: String,
    },

    /// Row store could not be finalized
    #[error("Row store finalization failed: {0}")]
    Finalize(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether the error stops the whole run rather than one domain
    pub fn is_fatal_to_run(&self) -> bool {
        match self {
            PipelineError::Source(e) => e.is_fatal_to_run(),
            PipelineError::IdentifiersExhausted => true,
            _ => false,
        }
    }
}
