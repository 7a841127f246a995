//! Run configuration.

use crate::cli::Cli;
use crate::error::Result;
use harvest_domain::IdAllocation;
use harvest_pipeline::PipelineConfig;
use harvest_source::SourceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration, loaded from TOML and overridden by command-line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Archival store connection
    #[serde(default)]
    pub database: SourceConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory receiving the record logs and the row store
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// File name prefix of the row store
    #[serde(default = "default_row_store_prefix")]
    pub row_store_prefix: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl RunConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load the configured file (if any) and apply command-line overrides.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.hostname {
            self.database.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.database.port = port;
        }
        if let Some(dbname) = &cli.database {
            self.database.dbname = dbname.clone();
        }
        if let Some(user) = &cli.user {
            self.database.user = user.clone();
        }
        if let Some(password) = &cli.password {
            self.database.password = Some(password.clone());
        }
        if let Some(dir) = &cli.output_dir {
            self.output.dir = dir.clone();
        }
    }

    /// Pipeline configuration for a run with the given identifier allocation.
    pub fn pipeline_config(&self, id_allocation: IdAllocation) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.output.dir.clone(),
            row_store_prefix: self.output.row_store_prefix.clone(),
            id_allocation,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            row_store_prefix: default_row_store_prefix(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_row_store_prefix() -> String {
    "fulltext".to_string()
}

fn default_level() -> String {
    "info".to_string()
}
