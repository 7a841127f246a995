//! Job file loading.

use crate::error::Result;
use harvest_domain::Publication;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The publications to harvest in one run, in processing order.
///
/// Entries are validated per domain by the pipeline, so a bad entry fails
/// only its own domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    /// Publication entries
    pub publications: Vec<Publication>,
}

impl JobFile {
    /// Parse a job file from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load a job file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}
