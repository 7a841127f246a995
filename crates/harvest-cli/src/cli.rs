//! CLI argument parsing.

use clap::{ArgGroup, Parser};
use harvest_domain::IdAllocation;
use std::path::PathBuf;

/// Harvest - Extract deduplicated full texts per publication domain.
#[derive(Debug, Parser)]
#[command(name = "harvest")]
#[command(version, about, long_about = None)]
#[command(group(
    ArgGroup::new("id_allocation")
        .required(true)
        .args(["starting_id", "disable_id"])
))]
pub struct Cli {
    /// Run configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Job file listing the publications to harvest (YAML)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub filter_yaml_file: PathBuf,

    /// Archival database host
    #[arg(long)]
    pub hostname: Option<String>,

    /// Archival database port
    #[arg(long)]
    pub port: Option<u16>,

    /// Archival database name
    #[arg(long)]
    pub database: Option<String>,

    /// Archival database user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Archival database password
    #[arg(long, env = "HARVEST_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Directory receiving the record logs and the row store
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// First identifier to assign
    #[arg(long, value_name = "N")]
    pub starting_id: Option<u64>,

    /// Assign the default identifier to every record
    #[arg(long)]
    pub disable_id: bool,
}

impl Cli {
    /// Identifier allocation selected on the command line
    pub fn id_allocation(&self) -> IdAllocation {
        match (self.disable_id, self.starting_id) {
            (false, Some(starting_value)) => IdAllocation::Enabled { starting_value },
            _ => IdAllocation::Disabled,
        }
    }
}
