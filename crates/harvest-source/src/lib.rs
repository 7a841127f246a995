//! Harvest Source Layer
//!
//! Implementations of the [`FulltextSource`] trait from `harvest-domain`.
//!
//! # Sources
//!
//! - [`PostgresSource`]: the archival store, queried over a blocking client
//! - [`MemorySource`]: deterministic in-memory rows for testing
//!
//! Both share the row interpretation in [`rows`], so a malformed row is
//! reported the same way whichever source produced it.
//!
//! # Examples
//!
//! ```
//! use harvest_source::MemorySource;
//! use harvest_domain::traits::FulltextSource;
//!
//! let mut source = MemorySource::new();
//! source.add_metadata(
//!     "avisa.no",
//!     "r1",
//!     "crawl/1.warc.gz",
//!     "h1",
//!     "https://avisa.no/a",
//!     "2024-01-01T00:00:00Z",
//! );
//! source.add_text("h1", "Hei");
//!
//! let metadata = source.fetch_metadata("avisa.no").unwrap();
//! assert_eq!(metadata.len(), 1);
//! assert_eq!(source.fetch_texts("h1").unwrap(), vec!["Hei"]);
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod memory;
pub mod rows;

pub use crate::archive::{PostgresSource, SourceConfig};
pub use crate::memory::MemorySource;
