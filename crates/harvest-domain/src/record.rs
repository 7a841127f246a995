//! Output records written to the sinks

use crate::fulltext::FulltextMetadata;
use crate::identifier::AssignedId;
use crate::publication::Publication;
use serde::{Deserialize, Serialize};

/// One line of the record log
///
/// The union of the job entry, the provenance metadata, the assigned
/// identifier and the raw text. Written once per
/// (domain, content hash, text variant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Assigned identifier
    pub assigned_id: AssignedId,
    /// Content hash of the body
    pub content_hash: String,
    /// Publication title
    pub title: String,
    /// Publication domain
    pub domain: String,
    /// Responsible-editor flag
    pub responsible_editor: bool,
    /// Geographic place
    pub place: String,
    /// Geographic county
    pub county: String,
    /// Source-assigned record identifier
    pub source_record_id: String,
    /// Origin path of the archived record
    pub origin_path: String,
    /// Timestamp as `YYYYMMDD`
    pub timestamp: String,
    /// Origin URI
    pub uri: String,
    /// Raw text variant
    pub text: String,
}

impl OutputRecord {
    /// Assemble a record from its parts
    pub fn new(
        assigned_id: AssignedId,
        publication: &Publication,
        metadata: &FulltextMetadata,
        text: impl Into<String>,
    ) -> Self {
        Self {
            assigned_id,
            content_hash: metadata.content_hash.clone(),
            title: publication.title.clone(),
            domain: publication.domain.clone(),
            responsible_editor: publication.has_responsible_editor(),
            place: publication.place.clone(),
            county: publication.county.clone(),
            source_record_id: metadata.record_id.clone(),
            origin_path: metadata.origin_path.clone(),
            timestamp: metadata.timestamp.clone(),
            uri: metadata.uri.clone(),
            text: text.into(),
        }
    }

    /// Reduced form for the row store, without the raw text
    pub fn to_row(&self, variant: usize) -> RowStoreRecord {
        RowStoreRecord {
            assigned_id: self.assigned_id,
            descriptor: format!(
                "{}/{}/{}/{}",
                self.domain, self.timestamp, self.content_hash, variant
            ),
            content_hash: self.content_hash.clone(),
            title: self.title.clone(),
            domain: self.domain.clone(),
            responsible_editor: self.responsible_editor,
            place: self.place.clone(),
            county: self.county.clone(),
            source_record_id: self.source_record_id.clone(),
            origin_path: self.origin_path.clone(),
            timestamp: self.timestamp.clone(),
            uri: self.uri.clone(),
        }
    }
}

/// Metadata row written to the row store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowStoreRecord {
    /// Assigned identifier
    pub assigned_id: AssignedId,
    /// Origin descriptor mapped to the identifier
    pub descriptor: String,
    /// Content hash of the body
    pub content_hash: String,
    /// Publication title
    pub title: String,
    /// Publication domain
    pub domain: String,
    /// Responsible-editor flag
    pub responsible_editor: bool,
    /// Geographic place
    pub place: String,
    /// Geographic county
    pub county: String,
    /// Source-assigned record identifier
    pub source_record_id: String,
    /// Origin path of the archived record
    pub origin_path: String,
    /// Timestamp as `YYYYMMDD`
    pub timestamp: String,
    /// Origin URI
    pub uri: String,
}
