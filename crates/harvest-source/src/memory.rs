//! Deterministic in-memory source

use crate::rows::{metadata_from_row, texts_from_rows};
use harvest_domain::traits::FulltextSource;
use harvest_domain::{
    dedupe_metadata, empty_content_hash, timestamp_instant, FulltextMetadata, SourceError,
};
use std::collections::{HashMap, HashSet};

/// In-memory archival store for testing
///
/// Mirrors the semantics of [`PostgresSource`](crate::PostgresSource):
/// metadata rows are filtered by domain, rows carrying the empty-body hash
/// are excluded, and the rest are ordered by hash, instant and origin
/// before deduplication. Timestamps compare as instants, as a typed
/// database column would. Failures can be injected per domain and per hash.
///
/// # Examples
///
/// ```
/// use harvest_source::MemorySource;
/// use harvest_domain::traits::FulltextSource;
///
/// let mut source = MemorySource::new();
/// source.fail_domain("broken.no");
/// assert!(source.fetch_metadata("broken.no").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    empty_content_hash: String,
    metadata: Vec<(String, Vec<Option<String>>)>,
    texts: HashMap<String, Vec<Vec<Option<String>>>>,
    failing_domains: HashSet<String>,
    failing_hashes: HashSet<String>,
    metadata_calls: usize,
    text_calls: usize,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Create an empty source using the SHA-256 empty-body hash
    pub fn new() -> Self {
        Self {
            empty_content_hash: empty_content_hash(),
            metadata: Vec::new(),
            texts: HashMap::new(),
            failing_domains: HashSet::new(),
            failing_hashes: HashSet::new(),
            metadata_calls: 0,
            text_calls: 0,
        }
    }

    /// Add a well-formed metadata row
    pub fn add_metadata(
        &mut self,
        domain: &str,
        record_id: &str,
        origin_path: &str,
        content_hash: &str,
        uri: &str,
        timestamp: &str,
    ) {
        self.add_raw_metadata_row(
            domain,
            vec![
                Some(record_id.to_string()),
                Some(origin_path.to_string()),
                Some(content_hash.to_string()),
                Some(uri.to_string()),
                Some(timestamp.to_string()),
            ],
        );
    }

    /// Add a metadata row exactly as the store would return it
    pub fn add_raw_metadata_row(&mut self, domain: &str, columns: Vec<Option<String>>) {
        self.metadata.push((domain.to_string(), columns));
    }

    /// Add one text variant for a hash
    pub fn add_text(&mut self, content_hash: &str, text: &str) {
        self.add_raw_text_row(content_hash, vec![Some(text.to_string())]);
    }

    /// Add a text row exactly as the store would return it
    pub fn add_raw_text_row(&mut self, content_hash: &str, columns: Vec<Option<String>>) {
        self.texts
            .entry(content_hash.to_string())
            .or_default()
            .push(columns);
    }

    /// Make every metadata query for `domain` fail
    pub fn fail_domain(&mut self, domain: &str) {
        self.failing_domains.insert(domain.to_string());
    }

    /// Make every text query for `content_hash` fail
    pub fn fail_hash(&mut self, content_hash: &str) {
        self.failing_hashes.insert(content_hash.to_string());
    }

    /// Number of metadata queries served
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls
    }

    /// Number of text queries served
    pub fn text_calls(&self) -> usize {
        self.text_calls
    }
}

impl FulltextSource for MemorySource {
    fn fetch_metadata(&mut self, domain: &str) -> Result<Vec<FulltextMetadata>, SourceError> {
        self.metadata_calls += 1;
        if self.failing_domains.contains(domain) {
            return Err(SourceError::Query(format!(
                "Injected failure for domain {}",
                domain
            )));
        }

        let column = |columns: &Vec<Option<String>>, idx: usize| {
            columns.get(idx).cloned().flatten()
        };
        let sentinel = Some(self.empty_content_hash.as_str());

        let mut rows: Vec<Vec<Option<String>>> = self
            .metadata
            .iter()
            .filter(|(d, _)| d == domain)
            .map(|(_, columns)| columns.clone())
            .filter(|columns| column(columns, 2).as_deref() != sentinel)
            .collect();
        rows.sort_by_key(|columns| {
            let instant = column(columns, 4).and_then(|raw| timestamp_instant(&raw));
            (column(columns, 2), instant, column(columns, 3))
        });

        let mut metadata = Vec::with_capacity(rows.len());
        for columns in rows {
            if let Some(entry) = metadata_from_row(columns, &self.empty_content_hash)? {
                metadata.push(entry);
            }
        }
        Ok(dedupe_metadata(metadata))
    }

    fn fetch_texts(&mut self, content_hash: &str) -> Result<Vec<String>, SourceError> {
        self.text_calls += 1;
        if self.failing_hashes.contains(content_hash) {
            return Err(SourceError::Query(format!(
                "Injected failure for hash {}",
                content_hash
            )));
        }

        let rows = self.texts.get(content_hash).cloned().unwrap_or_default();
        texts_from_rows(rows)
    }
}
