//! PostgreSQL-backed archival store

use crate::rows::{metadata_from_row, texts_from_rows};
use harvest_domain::traits::FulltextSource;
use harvest_domain::{dedupe_metadata, empty_content_hash, FulltextMetadata, SourceError};
use postgres::{Client, NoTls, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Provenance rows of a domain, earliest origin first within each hash
const METADATA_QUERY: &str = "\
    SELECT record_id::text, warc_path::text, fulltext_hash::text, target_uri::text, date::text \
    FROM warcinfo \
    WHERE domain = $1 \
      AND fulltext_hash IS NOT NULL \
      AND fulltext_hash <> '' \
      AND fulltext_hash <> $2 \
    ORDER BY fulltext_hash, date, target_uri";

/// Raw text variants of one body
const TEXT_QUERY: &str = "SELECT fulltext::text FROM fulltext WHERE fulltext_hash = $1";

/// Connection settings for the archival store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database host
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    #[serde(default = "default_dbname")]
    pub dbname: String,

    /// Database user
    #[serde(default = "default_user")]
    pub user: String,

    /// Database password
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Hash of the empty body, excluded from every domain
    #[serde(default = "empty_content_hash")]
    pub empty_content_hash: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: default_user(),
            password: None,
            empty_content_hash: empty_content_hash(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_dbname() -> String {
    "warc".to_string()
}

fn default_user() -> String {
    "postgres".to_string()
}

/// Archival store reached over a single blocking connection
///
/// The connection is held for the lifetime of the value. It is closed by
/// [`FulltextSource::close`] at the end of a run, or when the value is
/// dropped.
pub struct PostgresSource {
    client: Client,
    empty_content_hash: String,
}

impl PostgresSource {
    /// Open the connection for a run
    pub fn connect(config: &SourceConfig) -> Result<Self, SourceError> {
        let mut pg = postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.dbname)
            .user(&config.user);
        if let Some(password) = &config.password {
            pg.password(password);
        }

        let client = pg.connect(NoTls).map_err(query_error)?;
        info!(
            "Connected to archive {}@{}:{}/{}",
            config.user, config.host, config.port, config.dbname
        );

        Ok(Self {
            client,
            empty_content_hash: config.empty_content_hash.clone(),
        })
    }
}

impl FulltextSource for PostgresSource {
    fn fetch_metadata(&mut self, domain: &str) -> Result<Vec<FulltextMetadata>, SourceError> {
        let rows = self
            .client
            .query(METADATA_QUERY, &[&domain, &self.empty_content_hash])
            .map_err(query_error)?;
        debug!("Metadata query for {} returned {} rows", domain, rows.len());

        let mut metadata = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(entry) = metadata_from_row(text_columns(row)?, &self.empty_content_hash)? {
                metadata.push(entry);
            }
        }

        Ok(dedupe_metadata(metadata))
    }

    fn fetch_texts(&mut self, content_hash: &str) -> Result<Vec<String>, SourceError> {
        let rows = self
            .client
            .query(TEXT_QUERY, &[&content_hash])
            .map_err(query_error)?;

        let columns = rows
            .iter()
            .map(text_columns)
            .collect::<Result<Vec<_>, _>>()?;
        texts_from_rows(columns)
    }

    fn close(self) -> Result<(), SourceError> {
        self.client.close().map_err(query_error)?;
        info!("Archive connection closed");
        Ok(())
    }
}

fn text_columns(row: &Row) -> Result<Vec<Option<String>>, SourceError> {
    (0..row.len())
        .map(|idx| row.try_get::<_, Option<String>>(idx).map_err(query_error))
        .collect()
}

fn query_error(e: postgres::Error) -> SourceError {
    SourceError::Query(e.to_string())
}
