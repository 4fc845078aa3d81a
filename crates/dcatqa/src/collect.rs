use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;

use crate::catalog::{Catalog, Scope};
use crate::fetch::{fetch_counts, Endpoint};
use crate::prelude::*;
use crate::query::{metric_query, total_query, TOTAL};
use crate::table::{AggregateTable, CountTable};

struct Job<'a> {
    scope: Scope,
    metric: &'a str,
    query: String,
}

fn jobs(catalog: &Catalog) -> Vec<Job<'_>> {
    let mut jobs = Vec::with_capacity(catalog.len() + 2);

    for scope in [Scope::Dataset, Scope::Distribution] {
        jobs.push(Job {
            scope,
            metric: TOTAL,
            query: total_query(scope),
        });
    }

    jobs.extend(catalog.iter().map(|metric| Job {
        scope: metric.scope,
        metric: &metric.name,
        query: metric_query(metric),
    }));

    jobs
}

/// Evaluates every metric of the catalog and returns the dataset and
/// the distribution aggregate (in that order).
///
/// Queries are sent in parallel on the global thread pool, but merged
/// in catalog order. The first failing query aborts the run.
pub(crate) fn run_catalog<E: Endpoint + ?Sized>(
    endpoint: &E,
    catalog: &Catalog,
    pbar: ProgressBar,
) -> DcatqaResult<(AggregateTable, AggregateTable)> {
    let jobs = jobs(catalog);
    log::info!("sending {} queries", jobs.len());

    let results = jobs
        .par_iter()
        .progress_with(pbar.clone())
        .map(|job| {
            log::debug!("fetching {} ({})", job.metric, job.scope);
            fetch_counts(endpoint, &job.query, job.metric)
        })
        .collect::<DcatqaResult<Vec<CountTable>>>();

    pbar.finish_and_clear();
    let results = results?;

    let mut results = jobs.iter().zip(results);
    let (Some((_, datasets)), Some((_, distributions))) =
        (results.next(), results.next())
    else {
        bail!("missing total counts");
    };

    let mut datasets = AggregateTable::from_totals(Scope::Dataset, datasets);
    let mut distributions =
        AggregateTable::from_totals(Scope::Distribution, distributions);

    for (job, counts) in results {
        match job.scope {
            Scope::Dataset => datasets = datasets.left_merge(counts)?,
            Scope::Distribution => {
                distributions = distributions.left_merge(counts)?
            }
        }
    }

    let datasets = datasets.fill_missing();
    let distributions = distributions.fill_missing();

    log::info!(
        "collected {} metric(s) for {} dataset and {} distribution \
            contributor(s)",
        catalog.len(),
        datasets.height(),
        distributions.height()
    );

    Ok((datasets, distributions))
}
