//! # dcatqa
//!
//! Computes data quality metrics per contributor of an open data
//! catalog that follows the DCAT-AP.de application profile. For every
//! quality criterion a SPARQL query counts the datasets or
//! distributions of each contributor that fail it; the counts are
//! merged into a dataset and a distribution table and finally turned
//! into the share of entries that pass each criterion.

use std::io::ErrorKind;
use std::process;

use clap::Parser;
use cli::{Args, Command};
use config::Config;
use error::{DcatqaError, DcatqaResult};
use polars::error::PolarsError;
use rayon::ThreadPoolBuilder;

pub(crate) mod prelude {
    pub(crate) use crate::config::Config;
    pub(crate) use crate::error::{bail, DcatqaError, DcatqaResult};
    pub(crate) use crate::progress::ProgressBarBuilder;
}

mod catalog;
mod cli;
mod collect;
mod commands;
mod config;
mod error;
mod fetch;
mod output;
mod progress;
mod query;
mod relative;
mod table;

fn num_threads(args: &Args, config: &Config) -> usize {
    if let Some(num_threads) = args.num_jobs {
        return num_threads;
    }

    config.num_jobs().unwrap_or(0)
}

fn run(args: Args) -> DcatqaResult<()> {
    let config = match args.config {
        Some(ref path) => Config::from_path(path)?,
        None => Config::discover()?,
    };

    ThreadPoolBuilder::new()
        .num_threads(num_threads(&args, &config))
        .build_global()
        .map_err(|e| DcatqaError::Other(e.to_string()))?;

    match args.cmd {
        Command::Catalog(cmd) => cmd.execute(&config),
        Command::Completions(cmd) => cmd.execute(),
        Command::Query(cmd) => cmd.execute(&config),
        Command::Run(cmd) => cmd.execute(&config),
    }
}

fn main() {
    let args = Args::parse();

    match run(args) {
        Ok(()) => process::exit(0),
        Err(DcatqaError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(DcatqaError::Polars(PolarsError::IO { error, .. }))
            if error.kind() == ErrorKind::BrokenPipe =>
        {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
