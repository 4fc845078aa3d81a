use clap::Parser;

use crate::catalog::Scope;
use crate::prelude::*;
use crate::query::{build_query, metric_query, TOTAL};

/// Print the SPARQL query of a metric.
///
/// The output can be pasted into the query form of the endpoint to
/// inspect the counts of a single metric.
#[derive(Debug, Parser)]
pub(crate) struct Query {
    /// The kind of entries to count. Required for `total`; for any
    /// other metric the scope of the catalog entry is used.
    #[arg(long, short)]
    scope: Option<Scope>,

    /// The name of the metric or `total`.
    #[arg(value_name = "metric")]
    metric: String,
}

impl Query {
    pub(crate) fn execute(self, config: &Config) -> DcatqaResult<()> {
        if self.metric == TOTAL {
            let Some(scope) = self.scope else {
                bail!("`total` requires the `--scope` option");
            };

            print!("{}", build_query(scope, TOTAL, ""));
            return Ok(());
        }

        let catalog = config.catalog()?;
        let Some(metric) = catalog.get(&self.metric) else {
            bail!("unknown metric `{}`", self.metric);
        };

        if let Some(scope) = self.scope {
            if scope != metric.scope {
                bail!(
                    "metric `{}` is counted on {}s",
                    metric.name,
                    metric.scope
                );
            }
        }

        print!("{}", metric_query(metric));
        Ok(())
    }
}
