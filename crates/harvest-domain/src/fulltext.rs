//! Full-text provenance metadata

use crate::error::SourceError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance of one distinct full-text body within a domain
///
/// One instance exists per distinct content hash. Created by the source
/// reader and consumed by the writer; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulltextMetadata {
    /// Source-assigned record identifier
    pub record_id: String,

    /// Origin path or reference of the archived record
    pub origin_path: String,

    /// Content hash identifying the full-text body
    pub content_hash: String,

    /// Origin URI the body was harvested from
    pub uri: String,

    /// Day-granularity timestamp formatted as `YYYYMMDD`
    pub timestamp: String,
}

/// Lowercase hex SHA-256 digest of the empty byte string
///
/// Bodies carrying this hash have no content and are excluded at the source.
///
/// # Examples
///
/// ```
/// use harvest_domain::empty_content_hash;
///
/// assert!(empty_content_hash().starts_with("e3b0c442"));
/// ```
pub fn empty_content_hash() -> String {
    format!("{:x}", Sha256::digest(b""))
}

/// Normalize an ISO-8601 timestamp to `YYYYMMDD`
///
/// Accepts a trailing `Z`, explicit offsets, a space instead of `T`,
/// naive date-times and bare dates. The calendar date is taken in the
/// timestamp's own offset, not converted to UTC.
///
/// # Examples
///
/// ```
/// use harvest_domain::normalize_timestamp;
///
/// assert_eq!(normalize_timestamp("2023-04-05T10:11:12Z").unwrap(), "20230405");
/// assert_eq!(normalize_timestamp("2023-04-05").unwrap(), "20230405");
/// ```
pub fn normalize_timestamp(raw: &str) -> Result<String, SourceError> {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y%m%d").to_string())
        .ok_or_else(|| SourceError::MalformedValue(format!("Unparsable timestamp '{}'", raw)))
}

/// The instant an ISO-8601 timestamp denotes, in UTC
///
/// Accepts the same forms as [`normalize_timestamp`]. Naive date-times
/// and bare dates are taken as UTC.
///
/// # Examples
///
/// ```
/// use harvest_domain::timestamp_instant;
///
/// let east = timestamp_instant("2024-01-01T01:00:00+02:00").unwrap();
/// let zulu = timestamp_instant("2024-01-01T00:30:00Z").unwrap();
/// assert!(east < zulu);
/// ```
pub fn timestamp_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(raw).map(|dt| dt.with_timezone(&Utc))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    let candidate = trimmed.replacen(' ', "T", 1);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&candidate) {
        return Some(dt);
    }
    // PostgreSQL renders timestamptz with an hour-only offset such as `+00`
    if let Ok(dt) = DateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S%.f%#z") {
        return Some(dt);
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&candidate, pattern) {
            return Some(dt.and_utc().into());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().into())
}
