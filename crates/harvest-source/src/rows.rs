//! Interpretation of raw source rows

use harvest_domain::{normalize_timestamp, FulltextMetadata, SourceError};

/// Columns of the metadata query, in order
pub const METADATA_COLUMNS: [&str; 5] =
    ["record_id", "warc_path", "fulltext_hash", "target_uri", "date"];

/// Columns of the text query, in order
pub const TEXT_COLUMNS: [&str; 1] = ["fulltext"];

/// Turn one metadata row into provenance metadata
///
/// Returns `Ok(None)` for rows that carry no usable content hash: null,
/// empty, or equal to `empty_hash`.
pub fn metadata_from_row(
    columns: Vec<Option<String>>,
    empty_hash: &str,
) -> Result<Option<FulltextMetadata>, SourceError> {
    if columns.len() != METADATA_COLUMNS.len() {
        return Err(SourceError::SchemaViolation {
            query: "metadata",
            expected: METADATA_COLUMNS.len(),
            got: columns.len(),
        });
    }

    let mut columns = columns.into_iter();
    let mut next = || columns.next().flatten();
    let record_id = next();
    let origin_path = next();
    let content_hash = next();
    let uri = next();
    let date = next();

    let content_hash = match content_hash {
        Some(hash) if !hash.is_empty() && hash != empty_hash => hash,
        _ => return Ok(None),
    };

    let date = date.ok_or_else(|| {
        SourceError::MalformedValue(format!("Missing timestamp for hash {}", content_hash))
    })?;

    Ok(Some(FulltextMetadata {
        record_id: record_id.unwrap_or_default(),
        origin_path: origin_path.unwrap_or_default(),
        content_hash,
        uri: uri.unwrap_or_default(),
        timestamp: normalize_timestamp(&date)?,
    }))
}

/// Flatten text rows into raw text values, in row order
///
/// A null text becomes the empty string.
pub fn texts_from_rows(rows: Vec<Vec<Option<String>>>) -> Result<Vec<String>, SourceError> {
    let mut texts = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != TEXT_COLUMNS.len() {
            return Err(SourceError::SchemaViolation {
                query: "fulltext",
                expected: TEXT_COLUMNS.len(),
                got: row.len(),
            });
        }
        texts.extend(row.into_iter().map(Option::unwrap_or_default));
    }
    Ok(texts)
}
