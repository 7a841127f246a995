//! Harvest CLI library.
//!
//! Argument parsing, run configuration and job file loading for the
//! `harvest` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod job;

pub use cli::Cli;
pub use config::RunConfig;
pub use error::{CliError, Result};
pub use job::JobFile;
