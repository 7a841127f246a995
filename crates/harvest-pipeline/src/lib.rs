//! Harvest Pipeline
//!
//! Drives the per-domain extraction and assignment pipeline.
//!
//! # Architecture
//!
//! ```text
//! Pipeline → FulltextSource → dedupe → { tokenize_text, IdAllocator }
//!                                              │
//!                                              └→ DualSinkWriter
//!                                                   ├─ RecordLog (JSON lines)
//!                                                   └─ RowStore
//! ```
//!
//! # Failure isolation
//!
//! Every domain ends as [`DomainStatus::Completed`] or
//! [`DomainStatus::Failed`]; a failed domain never stops the run. Records
//! already emitted by a failed domain stay in both sinks and keep their
//! identifiers. A row-store insert failing after the record log entry was
//! written is collected as a [`SinkWriteFailure`] so operators can
//! reconcile the two sinks. The only error that stops the domain loop is a
//! schema violation from the source.

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
pub mod record_log;
mod report;
mod writer;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use record_log::{LogFile, RecordLog};
pub use report::{DomainOutcome, DomainStage, DomainStatus, RunReport, SinkWriteFailure};
pub use writer::DualSinkWriter;
