//! Configuration for the pipeline

use harvest_domain::IdAllocation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory receiving the record logs and the row store
    pub output_dir: PathBuf,

    /// File name prefix of the row store
    pub row_store_prefix: String,

    /// Identifier allocation for the run
    pub id_allocation: IdAllocation,
}

impl PipelineConfig {
    /// Create a configuration writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, id_allocation: IdAllocation) -> Self {
        Self {
            output_dir: output_dir.into(),
            id_allocation,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.row_store_prefix.is_empty() {
            return Err("row_store_prefix must not be empty".to_string());
        }
        if self.row_store_prefix.contains(['/', '\\']) {
            return Err("row_store_prefix must not contain path separators".to_string());
        }
        if let IdAllocation::Enabled { starting_value } = self.id_allocation {
            if starting_value > i64::MAX as u64 {
                return Err(format!(
                    "starting identifier {} exceeds the row store range",
                    starting_value
                ));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            row_store_prefix: "fulltext".to_string(),
            id_allocation: IdAllocation::Disabled,
        }
    }
}
