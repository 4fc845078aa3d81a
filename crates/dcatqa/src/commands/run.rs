use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;
use url::Url;

use crate::collect::run_catalog;
use crate::fetch::SparqlEndpoint;
use crate::output::write_tables;
use crate::prelude::*;
use crate::relative::compute_relative;

const PBAR_FETCH: &str = "Fetching metrics: {pos}/{len} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

/// Compute the quality metrics of all contributors.
///
/// Writes `datasets.csv` and `distributions.csv` with the absolute
/// number of entries failing each criterion, and `relative.csv` with
/// the share of entries passing it. No file is written if any query
/// fails.
#[derive(Debug, Parser)]
pub(crate) struct Run {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// The URL of the SPARQL endpoint.
    #[arg(long, env = "DCATQA_ENDPOINT", value_name = "url")]
    endpoint: Option<Url>,

    /// Abort a query after `seconds`.
    #[arg(long, value_name = "seconds")]
    timeout: Option<u64>,

    /// Skip contributors that have distributions, but no datasets,
    /// instead of failing.
    #[arg(long)]
    lenient: bool,

    /// The value written to `relative.csv` for contributors without
    /// any entries of a scope. Defaults to an empty cell.
    #[arg(long, value_name = "marker")]
    missing_marker: Option<String>,

    /// Write the tables into `directory`.
    #[arg(short, long, value_name = "directory", default_value = ".")]
    output: PathBuf,
}

impl Run {
    fn init_logger(&self) {
        let level = if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Info
        };

        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
    }

    pub(crate) fn execute(self, config: &Config) -> DcatqaResult<()> {
        self.init_logger();

        if let Some(path) = config.path() {
            log::debug!("using config {}", path.display());
        }

        let url = match self.endpoint {
            Some(url) => url,
            None => config.endpoint()?,
        };

        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.timeout());

        let marker = self
            .missing_marker
            .as_deref()
            .unwrap_or_else(|| config.missing_marker());

        let catalog = config.catalog()?;
        log::info!("querying {url}");

        let endpoint = SparqlEndpoint::new(url, timeout)?;
        let pbar = ProgressBarBuilder::new(PBAR_FETCH, self.quiet)
            .len(catalog.len() as u64 + 2)
            .build();

        let (datasets, distributions) =
            run_catalog(&endpoint, &catalog, pbar)?;
        let relative = compute_relative(
            &datasets,
            &distributions,
            self.lenient || config.lenient,
        )?;

        write_tables(
            &self.output,
            &datasets,
            &distributions,
            &relative,
            marker,
        )
    }
}
