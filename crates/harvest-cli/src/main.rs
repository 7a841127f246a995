//! Harvest CLI - Extract deduplicated full texts per publication domain.

use clap::Parser;
use harvest_cli::{Cli, CliError, JobFile, RunConfig};
use harvest_domain::WordTokenizer;
use harvest_pipeline::Pipeline;
use harvest_source::PostgresSource;
use harvest_store::SqliteRowStore;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run one harvest; returns whether the run finished without aborting.
fn run() -> harvest_cli::Result<bool> {
    let cli = Cli::parse();
    let config = RunConfig::resolve(&cli)?;

    // Log to stderr; stdout carries the run summary
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let job = JobFile::load(&cli.filter_yaml_file)?;
    let pipeline_config = config.pipeline_config(cli.id_allocation());
    pipeline_config.validate().map_err(CliError::Config)?;

    fs::create_dir_all(&pipeline_config.output_dir)?;
    info!(
        "Harvesting {} publications into {}",
        job.publications.len(),
        pipeline_config.output_dir.display()
    );

    let source = PostgresSource::connect(&config.database)?;
    let store = SqliteRowStore::create(
        &pipeline_config.output_dir,
        &pipeline_config.row_store_prefix,
    )?;

    let pipeline = Pipeline::new(source, store, WordTokenizer, pipeline_config);
    let report = pipeline.run(&job.publications);
    println!("{}", report.summary());

    Ok(report.aborted.is_none() && report.finalize_error.is_none())
}
