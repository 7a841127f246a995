//! Pipeline orchestrator

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::record_log::RecordLog;
use crate::report::{DomainOutcome, DomainStage, DomainStatus, RunReport, SinkWriteFailure};
use crate::writer::DualSinkWriter;
use harvest_domain::traits::{FulltextSource, RowStore};
use harvest_domain::{dedupe_texts, tokenize_text, DomainError, Publication, Tokenizer};
use std::collections::HashSet;
use tracing::{error, info, warn};

/// A domain failure together with the work done before it
struct DomainFailure {
    stage: DomainStage,
    error: PipelineError,
    records: usize,
}

impl DomainFailure {
    fn at(stage: DomainStage, records: usize) -> impl FnOnce(PipelineError) -> Self {
        move |error| Self {
            stage,
            error,
            records,
        }
    }
}

/// Drives the per-domain loop and isolates per-domain failures
///
/// Domains are processed one at a time, in job order; within a domain every
/// text variant is written to both sinks before the next one is started.
///
/// # Examples
///
/// ```no_run
/// use harvest_pipeline::{Pipeline, PipelineConfig};
/// use harvest_domain::{IdAllocation, WordTokenizer};
/// use harvest_source::MemorySource;
/// use harvest_store::SqliteRowStore;
///
/// let config = PipelineConfig::new("output", IdAllocation::Enabled { starting_value: 1 });
/// let store = SqliteRowStore::create(&config.output_dir, &config.row_store_prefix).unwrap();
/// let pipeline = Pipeline::new(MemorySource::new(), store, WordTokenizer, config);
///
/// let report = pipeline.run(&[]);
/// println!("{}", report.summary());
/// ```
pub struct Pipeline<Src, S, T>
where
    Src: FulltextSource,
    S: RowStore,
    T: Tokenizer,
{
    source: Src,
    writer: DualSinkWriter<S>,
    tokenizer: T,
    config: PipelineConfig,
}

impl<Src, S, T> Pipeline<Src, S, T>
where
    Src: FulltextSource,
    S: RowStore,
    T: Tokenizer,
{
    /// Wire a pipeline for one run
    pub fn new(source: Src, store: S, tokenizer: T, config: PipelineConfig) -> Self {
        Self {
            source,
            writer: DualSinkWriter::new(store, config.id_allocation),
            tokenizer,
            config,
        }
    }

    /// Harvest every publication and finalize the row store
    ///
    /// Consumes the pipeline and closes the source when the domain loop
    /// ends. Failed domains are logged and reported; a source schema
    /// violation stops the loop but the row store is still finalized.
    pub fn run(mut self, publications: &[Publication]) -> RunReport {
        let mut report = RunReport::default();
        let mut seen = HashSet::new();

        for publication in publications {
            let result = if seen.insert(publication.domain.clone()) {
                self.process_domain(publication, &mut report.sink_failures)
            } else {
                Err(DomainFailure {
                    stage: DomainStage::Validating,
                    error: DomainError::DuplicateDomain(publication.domain.clone()).into(),
                    records: 0,
                })
            };

            match result {
                Ok(records) => {
                    info!("Completed domain {} ({} records)", publication.domain, records);
                    report.outcomes.push(DomainOutcome {
                        domain: publication.domain.clone(),
                        status: DomainStatus::Completed { records },
                    });
                }
                Err(failure) => {
                    error!(
                        "Domain {} failed while {}: {}",
                        publication.domain, failure.stage, failure.error
                    );
                    let fatal = failure.error.is_fatal_to_run();
                    report.outcomes.push(DomainOutcome {
                        domain: publication.domain.clone(),
                        status: DomainStatus::Failed {
                            stage: failure.stage,
                            reason: failure.error.to_string(),
                            records: failure.records,
                        },
                    });
                    if fatal {
                        error!("Aborting run: {}", failure.error);
                        report.aborted = Some(failure.error.to_string());
                        break;
                    }
                }
            }
        }

        let Self { source, writer, .. } = self;
        if let Err(e) = source.close() {
            warn!("Closing the source failed: {}", e);
        }

        match writer.finish() {
            Ok(path) => report.row_store_path = Some(path),
            Err(e) => {
                error!("{}", e);
                report.finalize_error = Some(e.to_string());
            }
        }

        report
    }

    /// Process one domain to completion
    ///
    /// Returns the number of records appended to the domain's record log.
    fn process_domain(
        &mut self,
        publication: &Publication,
        sink_failures: &mut Vec<SinkWriteFailure>,
    ) -> Result<usize, DomainFailure> {
        publication
            .validate()
            .map_err(PipelineError::from)
            .map_err(DomainFailure::at(DomainStage::Validating, 0))?;

        info!("Processing domain {}", publication.domain);
        let metadata = self
            .source
            .fetch_metadata(&publication.domain)
            .map_err(PipelineError::from)
            .map_err(DomainFailure::at(DomainStage::Fetching, 0))?;
        info!("Found {} fulltext hashes", metadata.len());

        let mut log = RecordLog::create(&self.config.output_dir, &publication.domain)
            .map_err(DomainFailure::at(DomainStage::Processing, 0))?;

        for entry in &metadata {
            let records = log.entries();
            let texts = self
                .source
                .fetch_texts(&entry.content_hash)
                .map_err(PipelineError::from)
                .map_err(DomainFailure::at(DomainStage::Processing, records))?;

            for (variant, text) in dedupe_texts(texts).iter().enumerate() {
                let tokens = tokenize_text(&self.tokenizer, text);
                match self
                    .writer
                    .emit(&mut log, publication, entry, variant, text, &tokens)
                {
                    Ok(_) => {}
                    Err(PipelineError::SinkWrite {
                        assigned_id,
                        content_hash,
                        reason,
                    }) => {
                        warn!(
                            "Record {} of {} is in the record log but not the row store: {}",
                            assigned_id, publication.domain, reason
                        );
                        sink_failures.push(SinkWriteFailure {
                            domain: publication.domain.clone(),
                            assigned_id,
                            content_hash,
                            reason,
                        });
                    }
                    Err(e) => {
                        return Err(DomainFailure::at(DomainStage::Processing, log.entries())(e));
                    }
                }
            }
        }

        Ok(log.entries())
    }
}
