//! Publication job entries

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// One entry of the job configuration: a domain to harvest and its descriptors
///
/// Entries are loaded once per run and never mutated. The `domain` is the
/// partitioning key and is unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    /// Domain under which full-text records are grouped
    pub domain: String,

    /// Human-readable title of the publication
    pub title: String,

    /// Whether the publication has a responsible editor
    #[serde(
        rename = "have-responsible-editor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub responsible_editor: Option<bool>,

    /// Geographic place
    #[serde(default)]
    pub place: String,

    /// Geographic county
    #[serde(default)]
    pub county: String,
}

impl Publication {
    /// Validate the entry before any fetching starts
    ///
    /// An entry without the responsible-editor flag, or with the flag set to
    /// false, is rejected. So is an entry with an empty domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use harvest_domain::Publication;
    ///
    /// let entry = Publication {
    ///     domain: "example.no".to_string(),
    ///     title: "Example".to_string(),
    ///     responsible_editor: Some(true),
    ///     place: String::new(),
    ///     county: String::new(),
    /// };
    /// assert!(entry.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.domain.trim().is_empty() {
            return Err(DomainError::MissingField { field: "domain" });
        }
        match self.responsible_editor {
            Some(true) => Ok(()),
            _ => Err(DomainError::MissingResponsibleEditor(self.domain.clone())),
        }
    }

    /// The validated responsible-editor flag
    pub fn has_responsible_editor(&self) -> bool {
        self.responsible_editor.unwrap_or(false)
    }
}
