//! Dual-sink writer

use crate::error::PipelineError;
use crate::record_log::{LogFile, RecordLog};
use harvest_domain::traits::RowStore;
use harvest_domain::{
    AssignedId, FulltextMetadata, IdAllocation, IdAllocator, OutputRecord, Publication,
    TokenRecord,
};
use tracing::debug;

/// Writes each record to the record log and then to the row store
///
/// Owns the run-scoped identifier counter and the row store, so every
/// emitted record advances the same counter regardless of its domain.
///
/// # Write protocol
///
/// 1. Append the record to the record log and sync it.
/// 2. Consume the identifier.
/// 3. Insert the metadata and token rows into the row store atomically.
///
/// A failure in step 1 consumes nothing, since the log is cut back to its
/// last complete entry. If that cut fails the identifier is consumed
/// anyway, so an identifier that may be on disk is never handed out again.
/// A failure in step 3 leaves the log entry in place and is reported as
/// [`PipelineError::SinkWrite`]. An exhausted counter fails before
/// anything is written.
pub struct DualSinkWriter<S: RowStore> {
    store: S,
    ids: IdAllocator,
}

impl<S: RowStore> DualSinkWriter<S> {
    /// Create a writer for a run
    pub fn new(store: S, id_allocation: IdAllocation) -> Self {
        Self {
            store,
            ids: IdAllocator::new(id_allocation),
        }
    }

    /// Emit one text variant of a body to both sinks
    pub fn emit<F: LogFile>(
        &mut self,
        log: &mut RecordLog<F>,
        publication: &Publication,
        metadata: &FulltextMetadata,
        variant: usize,
        text: &str,
        tokens: &[TokenRecord],
    ) -> Result<AssignedId, PipelineError> {
        let assigned_id = self
            .ids
            .peek()
            .ok_or(PipelineError::IdentifiersExhausted)?;
        let record = OutputRecord::new(assigned_id, publication, metadata, text);

        match log.append(&record) {
            Ok(()) => self.ids.advance(),
            Err(e @ PipelineError::TornRecordLog { .. }) => {
                self.ids.advance();
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        self.store
            .insert_record(&record.to_row(variant), tokens)
            .map_err(|e| PipelineError::SinkWrite {
                assigned_id,
                content_hash: metadata.content_hash.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            "Emitted record {} for {} ({} tokens)",
            assigned_id,
            metadata.content_hash,
            tokens.len()
        );
        Ok(assigned_id)
    }

    /// Identifier counter of the run
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Finalize the row store and return its location
    pub fn finish(self) -> Result<std::path::PathBuf, PipelineError> {
        self.store
            .finalize()
            .map_err(|e| PipelineError::Finalize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_log::faulty::FaultyFile;
    use harvest_domain::RowStoreRecord;
    use std::path::PathBuf;

    /// Row store keeping rows in memory, failing on chosen identifiers
    #[derive(Default)]
    struct VecStore {
        rows: Vec<(RowStoreRecord, usize)>,
        fail_on: Vec<u64>,
    }

    impl RowStore for VecStore {
        type Error = String;

        fn insert_record(
            &mut self,
            record: &RowStoreRecord,
            tokens: &[TokenRecord],
        ) -> Result<(), Self::Error> {
            if self.fail_on.contains(&record.assigned_id.value()) {
                return Err("injected".to_string());
            }
            self.rows.push((record.clone(), tokens.len()));
            Ok(())
        }

        fn finalize(self) -> Result<PathBuf, Self::Error> {
            Ok(PathBuf::from(format!("rows-{}", self.rows.len())))
        }
    }

    fn publication() -> Publication {
        Publication {
            domain: "avisa.no".into(),
            title: "Avisa".into(),
            responsible_editor: Some(true),
            place: String::new(),
            county: String::new(),
        }
    }

    fn metadata(hash: &str) -> FulltextMetadata {
        FulltextMetadata {
            record_id: "r".into(),
            origin_path: "p".into(),
            content_hash: hash.into(),
            uri: "u".into(),
            timestamp: "20240101".into(),
        }
    }

    #[test]
    fn test_emit_writes_both_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RecordLog::create(dir.path(), "avisa.no").unwrap();
        let mut writer = DualSinkWriter::new(
            VecStore::default(),
            IdAllocation::Enabled { starting_value: 10 },
        );

        let id = writer
            .emit(&mut log, &publication(), &metadata("h1"), 0, "tekst", &[])
            .unwrap();
        assert_eq!(id.value(), 10);
        assert_eq!(log.entries(), 1);
        assert_eq!(writer.ids().peek(), Some(AssignedId::from_value(11)));
        assert_eq!(writer.finish().unwrap(), PathBuf::from("rows-1"));
    }

    #[test]
    fn test_row_store_failure_keeps_log_entry_and_consumes_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RecordLog::create(dir.path(), "avisa.no").unwrap();
        let store = VecStore {
            fail_on: vec![1],
            ..Default::default()
        };
        let mut writer = DualSinkWriter::new(store, IdAllocation::Enabled { starting_value: 1 });

        let err = writer
            .emit(&mut log, &publication(), &metadata("h1"), 0, "a", &[])
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SinkWrite { assigned_id, .. } if assigned_id.value() == 1
        ));
        assert_eq!(log.entries(), 1);

        let next = writer
            .emit(&mut log, &publication(), &metadata("h2"), 0, "b", &[])
            .unwrap();
        assert_eq!(next.value(), 2);
    }

    #[test]
    fn test_disabled_allocation_repeats_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RecordLog::create(dir.path(), "avisa.no").unwrap();
        let mut writer = DualSinkWriter::new(VecStore::default(), IdAllocation::Disabled);

        for hash in ["h1", "h2"] {
            let id = writer
                .emit(&mut log, &publication(), &metadata(hash), 0, hash, &[])
                .unwrap();
            assert_eq!(id.value(), 1);
        }
        assert_eq!(writer.ids().issued(), 2);
    }

    fn faulty_log() -> (RecordLog<FaultyFile>, FaultyFile) {
        let file = FaultyFile::default();
        let log = RecordLog::with_file(PathBuf::from("avisa.no.jsonl"), file.clone()).unwrap();
        (log, file)
    }

    #[test]
    fn test_failed_log_sync_does_not_consume_id() {
        let (mut log, file) = faulty_log();
        let mut writer =
            DualSinkWriter::new(VecStore::default(), IdAllocation::Enabled { starting_value: 5 });

        file.faults.sync.set(true);
        let err = writer
            .emit(&mut log, &publication(), &metadata("h1"), 0, "a", &[])
            .unwrap_err();
        assert!(matches!(err, PipelineError::RecordLog(_)));
        assert_eq!(writer.ids().peek(), Some(AssignedId::from_value(5)));
        assert!(file.contents().is_empty());

        file.faults.sync.set(false);
        let id = writer
            .emit(&mut log, &publication(), &metadata("h1"), 0, "a", &[])
            .unwrap();
        assert_eq!(id.value(), 5);
        assert_eq!(file.contents().lines().count(), 1);
    }

    #[test]
    fn test_torn_log_entry_consumes_id() {
        let (mut log, file) = faulty_log();
        let mut writer =
            DualSinkWriter::new(VecStore::default(), IdAllocation::Enabled { starting_value: 5 });

        file.faults.sync.set(true);
        file.faults.truncate.set(true);
        let err = writer
            .emit(&mut log, &publication(), &metadata("h1"), 0, "a", &[])
            .unwrap_err();
        assert!(matches!(err, PipelineError::TornRecordLog { .. }));
        assert_eq!(writer.ids().peek(), Some(AssignedId::from_value(6)));
    }

    #[test]
    fn test_exhausted_counter_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RecordLog::create(dir.path(), "avisa.no").unwrap();
        let mut writer = DualSinkWriter::new(
            VecStore::default(),
            IdAllocation::Enabled {
                starting_value: u64::MAX,
            },
        );

        let last = writer
            .emit(&mut log, &publication(), &metadata("h1"), 0, "a", &[])
            .unwrap();
        assert_eq!(last.value(), u64::MAX);

        let err = writer
            .emit(&mut log, &publication(), &metadata("h2"), 0, "b", &[])
            .unwrap_err();
        assert!(matches!(err, PipelineError::IdentifiersExhausted));
        assert_eq!(log.entries(), 1);
        assert_eq!(writer.finish().unwrap(), PathBuf::from("rows-1"));
    }
}
