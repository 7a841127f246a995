//! Per-domain outcomes and the run report

use harvest_domain::AssignedId;
use std::fmt;
use std::path::PathBuf;

/// Stage a domain was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainStage {
    /// Job entry validation, before any fetching
    Validating,
    /// Fetching provenance metadata
    Fetching,
    /// Fetching texts and emitting records
    Processing,
}

impl fmt::Display for DomainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DomainStage::Validating => "validating",
            DomainStage::Fetching => "fetching",
            DomainStage::Processing => "processing",
        };
        f.write_str(name)
    }
}

/// Final state of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainStatus {
    /// Every record was processed
    Completed {
        /// Records appended to the record log
        records: usize,
    },
    /// The domain was abandoned
    Failed {
        /// Stage the failure happened in
        stage: DomainStage,
        /// Error detail
        reason: String,
        /// Records appended before the failure; their identifiers stay consumed
        records: usize,
    },
}

/// Outcome of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOutcome {
    /// Domain name
    pub domain: String,
    /// Final state
    pub status: DomainStatus,
}

impl DomainOutcome {
    /// Whether the domain completed
    pub fn is_completed(&self) -> bool {
        matches!(self.status, DomainStatus::Completed { .. })
    }

    /// Records appended to the record log for this domain
    pub fn records(&self) -> usize {
        match self.status {
            DomainStatus::Completed { records } | DomainStatus::Failed { records, .. } => records,
        }
    }
}

/// A record present in the record log but missing from the row store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkWriteFailure {
    /// Domain of the record
    pub domain: String,
    /// Identifier written to the record log
    pub assigned_id: AssignedId,
    /// Content hash of the record
    pub content_hash: String,
    /// Row store error
    pub reason: String,
}

/// Aggregate result of a run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Outcome per domain, in job order
    pub outcomes: Vec<DomainOutcome>,

    /// Records needing reconciliation between the two sinks
    pub sink_failures: Vec<SinkWriteFailure>,

    /// Location of the finalized row store
    pub row_store_path: Option<PathBuf>,

    /// Error that prevented finalizing the row store
    pub finalize_error: Option<String>,

    /// Reason the domain loop was stopped early
    pub aborted: Option<String>,
}

impl RunReport {
    /// Domains that completed
    pub fn completed(&self) -> impl Iterator<Item = &DomainOutcome> {
        self.outcomes.iter().filter(|o| o.is_completed())
    }

    /// Domains that failed
    pub fn failed(&self) -> impl Iterator<Item = &DomainOutcome> {
        self.outcomes.iter().filter(|o| !o.is_completed())
    }

    /// Total records appended to record logs
    pub fn total_records(&self) -> usize {
        self.outcomes.iter().map(DomainOutcome::records).sum()
    }

    /// Whether every domain completed and both sinks agree
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none()
            && self.finalize_error.is_none()
            && self.sink_failures.is_empty()
            && self.failed().next().is_none()
    }

    /// Generate a summary report of the run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Harvest Run Summary".to_string(),
            "===================".to_string(),
            format!("Domains completed: {}", self.completed().count()),
            format!("Domains failed: {}", self.failed().count()),
            format!("Records emitted: {}", self.total_records()),
        ];

        match (&self.row_store_path, &self.finalize_error) {
            (Some(path), _) => lines.push(format!("Row store: {}", path.display())),
            (None, Some(err)) => lines.push(format!("Row store NOT finalized: {}", err)),
            (None, None) => {}
        }

        if let Some(reason) = &self.aborted {
            lines.push(format!("Run aborted: {}", reason));
        }

        if self.failed().next().is_some() {
            lines.push(String::new());
            lines.push("Failed domains:".to_string());
            for outcome in self.failed() {
                if let DomainStatus::Failed { stage, reason, records } = &outcome.status {
                    lines.push(format!(
                        "  {} ({} after {} records): {}",
                        outcome.domain, stage, records, reason
                    ));
                }
            }
        }

        if !self.sink_failures.is_empty() {
            lines.push(String::new());
            lines.push("Records in record log but not in row store:".to_string());
            for failure in &self.sink_failures {
                lines.push(format!(
                    "  {} id={} hash={}: {}",
                    failure.domain, failure.assigned_id, failure.content_hash, failure.reason
                ));
            }
        }

        lines.join("\n")
    }
}
