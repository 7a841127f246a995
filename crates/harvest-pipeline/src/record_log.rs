//! Append-only JSON-lines record log, one file per domain

use crate::error::PipelineError;
use harvest_domain::OutputRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::error;

/// File operations the record log relies on beyond writing
pub trait LogFile: Write + Seek {
    /// Truncate or extend the file to `size` bytes
    fn set_len(&self, size: u64) -> io::Result<()>;

    /// Flush written data to the storage device
    fn sync_data(&self) -> io::Result<()>;
}

impl LogFile for File {
    fn set_len(&self, size: u64) -> io::Result<()> {
        File::set_len(self, size)
    }

    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }
}

/// Record log of one domain
///
/// Every [`append`](Self::append) writes one JSON object followed by a
/// newline and syncs the file before returning. A failed append cuts the
/// file back to its last complete entry, so the log only ever holds whole
/// lines for appends that succeeded.
pub struct RecordLog<F: LogFile = File> {
    path: PathBuf,
    file: F,
    len: u64,
    entries: usize,
}

impl RecordLog<File> {
    /// Start the record log for `domain` in `dir`, replacing any previous one
    pub fn create(dir: &Path, domain: &str) -> Result<Self, PipelineError> {
        let path = log_path(dir, domain);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Self::with_file(path, file)
    }
}

impl<F: LogFile> RecordLog<F> {
    /// Append to an already opened log file, after its current end
    pub fn with_file(path: PathBuf, mut file: F) -> Result<Self, PipelineError> {
        let len = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            path,
            file,
            len,
            entries: 0,
        })
    }

    /// Append one record and make it durable
    ///
    /// On error the entry is not in the log, unless the error is
    /// [`PipelineError::TornRecordLog`].
    pub fn append(&mut self, record: &OutputRecord) -> Result<(), PipelineError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if let Err(e) = self.write_line(&line) {
            return Err(self.rollback(e));
        }

        self.len += line.len() as u64;
        self.entries += 1;
        Ok(())
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        self.file.flush()?;
        self.file.sync_data()
    }

    /// Cut the file back to the end of the last complete entry
    fn rollback(&mut self, cause: io::Error) -> PipelineError {
        let restored = self
            .file
            .set_len(self.len)
            .and_then(|()| self.file.seek(SeekFrom::Start(self.len)).map(|_| ()));

        match restored {
            Ok(()) => PipelineError::RecordLog(cause),
            Err(e) => {
                error!(
                    "Record log {} may end in a partial entry: {}",
                    self.path.display(),
                    e
                );
                PipelineError::TornRecordLog {
                    cause: cause.to_string(),
                    rollback: e.to_string(),
                }
            }
        }
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries appended so far
    pub fn entries(&self) -> usize {
        self.entries
    }
}

/// File the record log of `domain` is written to
///
/// Path separators in the domain are replaced by `_`.
pub fn log_path(dir: &Path, domain: &str) -> PathBuf {
    let name: String = domain
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    dir.join(format!("{}.jsonl", name))
}

/// Read every record of a log file back, in order
pub fn read_log(path: &Path) -> Result<Vec<OutputRecord>, PipelineError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
