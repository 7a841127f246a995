//! Order-preserving deduplication of source rows

use crate::fulltext::FulltextMetadata;
use std::collections::HashSet;

/// Keep the first occurrence of each content hash, in source order
///
/// # Examples
///
/// ```
/// use harvest_domain::{dedupe_metadata, FulltextMetadata};
///
/// let row = |hash: &str, uri: &str| FulltextMetadata {
///     record_id: "r".into(),
///     origin_path: "p".into(),
///     content_hash: hash.into(),
///     uri: uri.into(),
///     timestamp: "20240101".into(),
/// };
/// let rows = vec![row("h1", "a"), row("h1", "b"), row("h2", "c")];
/// let kept = dedupe_metadata(rows);
/// assert_eq!(kept.len(), 2);
/// assert_eq!(kept[0].uri, "a");
/// ```
pub fn dedupe_metadata(rows: Vec<FulltextMetadata>) -> Vec<FulltextMetadata> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.content_hash.clone()))
        .collect()
}

/// Keep the first occurrence of each distinct non-empty string, in source order
///
/// Empty strings are discarded entirely.
///
/// # Examples
///
/// ```
/// use harvest_domain::dedupe_texts;
///
/// let texts = vec!["", "a", "a", "b", ""];
/// assert_eq!(dedupe_texts(texts), vec!["a".to_string(), "b".to_string()]);
/// ```
pub fn dedupe_texts<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for text in texts {
        let text = text.into();
        if text.is_empty() || seen.contains(&text) {
            continue;
        }
        seen.insert(text.clone());
        kept.push(text);
    }
    kept
}
