//! Integration tests for harvest-pipeline
//!
//! These tests run whole harvests against an in-memory source and a real
//! SQLite row store, then reconcile the record logs against the row store.

use harvest_domain::traits::{FulltextSource, RowStore};
use harvest_domain::{
    AssignedId, FulltextMetadata, IdAllocation, Publication, RowStoreRecord, SourceError,
    TokenRecord, WordTokenizer,
};
use harvest_pipeline::record_log::{log_path, read_log};
use harvest_pipeline::{DomainStage, DomainStatus, Pipeline, PipelineConfig, RunReport};
use harvest_source::MemorySource;
use harvest_store::{RowStoreReader, SqliteRowStore, StoreError};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn publication(domain: &str) -> Publication {
    Publication {
        domain: domain.to_string(),
        title: format!("Title of {}", domain),
        responsible_editor: Some(true),
        place: "Trondheim".to_string(),
        county: "Trøndelag".to_string(),
    }
}

/// Two bodies for `domain`, the first with a duplicate and an empty variant
fn seed(source: &mut MemorySource, domain: &str) {
    let h1 = format!("{}-h1", domain);
    let h2 = format!("{}-h2", domain);
    let captures = [
        ("r1", "crawl/1.warc.gz", &h1, "1", "2024-02-01T08:00:00Z"),
        ("r1b", "crawl/2.warc.gz", &h1, "1b", "2024-03-01T08:00:00Z"),
        ("r2", "crawl/1.warc.gz", &h2, "2", "2024-02-02T08:00:00Z"),
    ];
    for (record_id, origin, hash, page, timestamp) in captures {
        let uri = format!("https://{}/{}", domain, page);
        source.add_metadata(domain, record_id, origin, hash, &uri, timestamp);
    }
    source.add_text(&h1, "Første avsnitt.\n\nTredje avsnitt.");
    source.add_text(&h1, "");
    source.add_text(&h1, "Første avsnitt.\n\nTredje avsnitt.");
    source.add_text(&h1, "En annen variant.");
    source.add_text(&h2, "Kort tekst");
}

fn config(dir: &Path, starting_value: u64) -> PipelineConfig {
    PipelineConfig::new(dir, IdAllocation::Enabled { starting_value })
}

fn run(source: MemorySource, config: PipelineConfig, publications: &[Publication]) -> RunReport {
    let store = SqliteRowStore::create(&config.output_dir, &config.row_store_prefix).unwrap();
    Pipeline::new(source, store, WordTokenizer, config).run(publications)
}

fn ids_in_log(dir: &Path, domain: &str) -> Vec<u64> {
    read_log(&log_path(dir, domain))
        .unwrap()
        .iter()
        .map(|r| r.assigned_id.value())
        .collect()
}

#[test]
fn test_full_run_assigns_contiguous_ids_across_domains() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");
    seed(&mut source, "b.no");

    let publications = [publication("a.no"), publication("b.no")];
    let report = run(source, config(dir.path(), 100), &publications);

    assert!(report.is_clean(), "{}", report.summary());
    assert_eq!(report.total_records(), 6);
    assert_eq!(ids_in_log(dir.path(), "a.no"), vec![100, 101, 102]);
    assert_eq!(ids_in_log(dir.path(), "b.no"), vec![103, 104, 105]);

    let path = report.row_store_path.unwrap();
    assert_eq!(path, dir.path().join("fulltext_100_105.sqlite"));
    assert!(!dir.path().join("fulltext.in-progress.sqlite").exists());
}

#[test]
fn test_record_log_and_row_store_agree() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");

    let report = run(source, config(dir.path(), 1), &[publication("a.no")]);
    let reader = RowStoreReader::open(report.row_store_path.as_ref().unwrap()).unwrap();

    let records = read_log(&log_path(dir.path(), "a.no")).unwrap();
    assert_eq!(reader.record_count().unwrap(), records.len() as u64);

    for record in &records {
        let rows = reader.metadata(record.assigned_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content_hash, record.content_hash);
        assert_eq!(rows[0].uri, record.uri);
        assert_eq!(rows[0].place, "Trondheim");

        let tokens = reader.tokens(record.assigned_id).unwrap();
        let expected = harvest_domain::tokenize_text(&WordTokenizer, &record.text);
        assert_eq!(tokens, expected);
    }
}

#[test]
fn test_variants_are_deduplicated_and_earliest_origin_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");

    run(source, config(dir.path(), 1), &[publication("a.no")]);
    let records = read_log(&log_path(dir.path(), "a.no")).unwrap();

    let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Første avsnitt.\n\nTredje avsnitt.", "En annen variant.", "Kort tekst"]
    );
    assert_eq!(records[0].uri, "https://a.no/1");
    assert_eq!(records[0].timestamp, "20240201");
    assert_eq!(records[0].source_record_id, "r1");
}

#[test]
fn test_paragraph_numbers_in_row_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");

    let report = run(source, config(dir.path(), 1), &[publication("a.no")]);
    let reader = RowStoreReader::open(report.row_store_path.unwrap()).unwrap();

    let tokens = reader.tokens(AssignedId::from_value(1)).unwrap();
    let paragraphs: Vec<_> = tokens.iter().map(|t| t.paragraph).collect();
    assert_eq!(paragraphs, vec![0, 0, 0, 2, 2, 2]);
    let sequences: Vec<_> = tokens.iter().map(|t| t.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_failed_fetch_does_not_stop_later_domains_or_consume_ids() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");
    seed(&mut source, "c.no");
    source.fail_domain("b.no");

    let report = run(
        source,
        config(dir.path(), 1),
        &[publication("a.no"), publication("b.no"), publication("c.no")],
    );

    assert_eq!(report.completed().count(), 2);
    assert!(matches!(
        report.outcomes[1].status,
        DomainStatus::Failed { stage: DomainStage::Fetching, records: 0, .. }
    ));
    assert_eq!(ids_in_log(dir.path(), "c.no"), vec![4, 5, 6]);
    assert!(!log_path(dir.path(), "b.no").exists());
    assert!(report.aborted.is_none());
}

#[test]
fn test_missing_responsible_editor_is_rejected_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");
    seed(&mut source, "b.no");

    let mut unedited = publication("a.no");
    unedited.responsible_editor = None;

    let store = SqliteRowStore::create(dir.path(), "fulltext").unwrap();
    let pipeline = Pipeline::new(source, store, WordTokenizer, config(dir.path(), 1));
    let report = pipeline.run(&[unedited, publication("b.no")]);

    match &report.outcomes[0].status {
        DomainStatus::Failed { stage, reason, .. } => {
            assert_eq!(*stage, DomainStage::Validating);
            assert!(reason.contains("No responsible editor"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(ids_in_log(dir.path(), "b.no"), vec![1, 2, 3]);
}

#[test]
fn test_text_failure_keeps_records_already_emitted() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");
    seed(&mut source, "b.no");
    source.fail_hash("a.no-h2");

    let report = run(source, config(dir.path(), 1), &[publication("a.no"), publication("b.no")]);

    assert_eq!(
        report.outcomes[0].status,
        DomainStatus::Failed {
            stage: DomainStage::Processing,
            reason: "Source query failed: Injected failure for hash a.no-h2".to_string(),
            records: 2,
        }
    );
    assert_eq!(ids_in_log(dir.path(), "a.no"), vec![1, 2]);
    assert_eq!(ids_in_log(dir.path(), "b.no"), vec![3, 4, 5]);

    let reader = RowStoreReader::open(report.row_store_path.unwrap()).unwrap();
    let ids: Vec<_> = reader.assigned_ids().unwrap().iter().map(|i| i.value()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_schema_violation_aborts_run_but_finalizes_row_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");
    source.add_raw_metadata_row("b.no", vec![Some("only".into()), Some("two".into())]);
    seed(&mut source, "c.no");

    let report = run(
        source,
        config(dir.path(), 1),
        &[publication("a.no"), publication("b.no"), publication("c.no")],
    );

    assert!(report.aborted.is_some());
    assert_eq!(report.outcomes.len(), 2, "c.no must not be attempted");
    assert_eq!(
        report.row_store_path,
        Some(dir.path().join("fulltext_1_3.sqlite"))
    );
    assert!(!log_path(dir.path(), "c.no").exists());
}

#[test]
fn test_duplicate_domain_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");

    let report = run(source, config(dir.path(), 1), &[publication("a.no"), publication("a.no")]);

    assert!(report.outcomes[0].is_completed());
    match &report.outcomes[1].status {
        DomainStatus::Failed { stage, reason, .. } => {
            assert_eq!(*stage, DomainStage::Validating);
            assert!(reason.contains("Duplicate"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(ids_in_log(dir.path(), "a.no"), vec![1, 2, 3]);
}

#[test]
fn test_disabled_allocation_uses_default_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");

    let config = PipelineConfig::new(dir.path(), IdAllocation::Disabled);
    let report = run(source, config, &[publication("a.no")]);

    assert_eq!(ids_in_log(dir.path(), "a.no"), vec![1, 1, 1]);
    assert_eq!(report.row_store_path, Some(dir.path().join("fulltext_1_1.sqlite")));
}

#[test]
fn test_empty_run_still_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(MemorySource::new(), config(dir.path(), 1), &[]);
    assert_eq!(report.row_store_path, Some(dir.path().join("fulltext_empty.sqlite")));
    assert!(report.is_clean());
}

/// SQLite row store that refuses chosen identifiers
struct FlakyStore {
    inner: SqliteRowStore,
    reject: Vec<u64>,
}

impl RowStore for FlakyStore {
    type Error = StoreError;

    fn insert_record(
        &mut self,
        record: &RowStoreRecord,
        tokens: &[TokenRecord],
    ) -> Result<(), Self::Error> {
        if self.reject.contains(&record.assigned_id.value()) {
            return Err(StoreError::InvalidData("database is locked".to_string()));
        }
        self.inner.insert_record(record, tokens)
    }

    fn finalize(self) -> Result<PathBuf, Self::Error> {
        self.inner.finalize()
    }
}

#[test]
fn test_sink_write_failure_is_reported_and_siblings_continue() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");

    let store = FlakyStore {
        inner: SqliteRowStore::create(dir.path(), "fulltext").unwrap(),
        reject: vec![2],
    };
    let report = Pipeline::new(source, store, WordTokenizer, config(dir.path(), 1))
        .run(&[publication("a.no")]);

    assert!(report.outcomes[0].is_completed());
    assert_eq!(report.total_records(), 3);
    assert_eq!(report.sink_failures.len(), 1);
    assert_eq!(report.sink_failures[0].assigned_id.value(), 2);
    assert_eq!(report.sink_failures[0].content_hash, "a.no-h1");
    assert!(report.summary().contains("a.no id=2 hash=a.no-h1"));

    // Every log entry is in the row store except the flagged one
    assert_eq!(ids_in_log(dir.path(), "a.no"), vec![1, 2, 3]);
    let reader = RowStoreReader::open(report.row_store_path.unwrap()).unwrap();
    let ids: Vec<_> = reader.assigned_ids().unwrap().iter().map(|i| i.value()).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(reader.tokens(AssignedId::from_value(2)).unwrap().is_empty());
}

#[test]
fn test_exhausted_identifiers_abort_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let mut source = MemorySource::new();
    seed(&mut source, "a.no");
    seed(&mut source, "b.no");

    let report = run(
        source,
        config(dir.path(), u64::MAX),
        &[publication("a.no"), publication("b.no")],
    );

    // The last identifier is logged but does not fit the row store
    assert_eq!(ids_in_log(dir.path(), "a.no"), vec![u64::MAX]);
    assert_eq!(report.sink_failures.len(), 1);
    assert_eq!(report.sink_failures[0].assigned_id.value(), u64::MAX);

    assert!(report.aborted.as_deref().unwrap().contains("exhausted"));
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.row_store_path, Some(dir.path().join("fulltext_empty.sqlite")));
}

/// In-memory source whose close is observable and fails
struct ClosingSource {
    inner: MemorySource,
    closed: Rc<Cell<bool>>,
}

impl FulltextSource for ClosingSource {
    fn fetch_metadata(&mut self, domain: &str) -> Result<Vec<FulltextMetadata>, SourceError> {
        self.inner.fetch_metadata(domain)
    }

    fn fetch_texts(&mut self, content_hash: &str) -> Result<Vec<String>, SourceError> {
        self.inner.fetch_texts(content_hash)
    }

    fn close(self) -> Result<(), SourceError> {
        self.closed.set(true);
        Err(SourceError::Query("connection reset".to_string()))
    }
}

#[test]
fn test_source_is_closed_at_run_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut inner = MemorySource::new();
    seed(&mut inner, "a.no");
    let closed = Rc::new(Cell::new(false));
    let source = ClosingSource {
        inner,
        closed: Rc::clone(&closed),
    };

    let store = SqliteRowStore::create(dir.path(), "fulltext").unwrap();
    let report = Pipeline::new(source, store, WordTokenizer, config(dir.path(), 1))
        .run(&[publication("a.no")]);

    assert!(closed.get());
    assert!(report.is_clean(), "{}", report.summary());
    assert_eq!(report.row_store_path, Some(dir.path().join("fulltext_1_3.sqlite")));
}
