use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use url::Url;

use crate::prelude::*;
use crate::query::CONTRIBUTOR_NS;
use crate::table::CountTable;

/// Something that answers SPARQL `SELECT` queries with CSV.
pub(crate) trait Endpoint: Sync {
    fn select_csv(&self, query: &str) -> DcatqaResult<String>;
}

/// A remote SPARQL endpoint queried via HTTP GET.
#[derive(Debug)]
pub(crate) struct SparqlEndpoint {
    client: Client,
    url: Url,
}

impl SparqlEndpoint {
    pub(crate) fn new(url: Url, timeout: Duration) -> DcatqaResult<Self> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            bail!("unsupported scheme {scheme}");
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

impl Endpoint for SparqlEndpoint {
    fn select_csv(&self, query: &str) -> DcatqaResult<String> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[("query", query)])
            .header(ACCEPT, "text/csv")
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message: String = body.chars().take(200).collect();
            return Err(DcatqaError::Status {
                status,
                message: message.trim().to_string(),
            });
        }

        Ok(body)
    }
}

/// Strips the contributor namespace from an identifier.
#[inline]
pub(crate) fn normalize_contributor(value: &str) -> &str {
    let value = value.trim();
    value.strip_prefix(CONTRIBUTOR_NS).unwrap_or(value)
}

/// Parses a CSV answer with the columns `contributor` and `metric`.
///
/// Identifiers are normalized and rows that end up with the same
/// contributor are summed up.
pub(crate) fn parse_counts(
    body: &str,
    metric: &str,
) -> DcatqaResult<CountTable> {
    if body.trim().is_empty() {
        return Err(DcatqaError::parse(metric, "empty response"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let position = |name: &str| -> DcatqaResult<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            DcatqaError::parse(
                metric,
                format!(
                    "missing column `{name}` (header = {})",
                    headers.iter().collect::<Vec<_>>().join(",")
                ),
            )
        })
    };

    let contributor_idx = position("contributor")?;
    let count_idx = position(metric)?;

    let mut table = CountTable::new(metric);
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let line = line + 2;

        let contributor = record
            .get(contributor_idx)
            .map(normalize_contributor)
            .unwrap_or_default();
        if contributor.is_empty() {
            return Err(DcatqaError::parse(
                metric,
                format!("empty contributor (line {line})"),
            ));
        }

        let value = record.get(count_idx).unwrap_or_default();
        let count = value.parse::<u64>().map_err(|_| {
            DcatqaError::parse(
                metric,
                format!("invalid count `{value}` (line {line})"),
            )
        })?;

        table.add(contributor, count);
    }

    Ok(table)
}

/// Runs `query` against the endpoint and returns the normalized
/// counts of `metric`.
pub(crate) fn fetch_counts<E: Endpoint + ?Sized>(
    endpoint: &E,
    query: &str,
    metric: &str,
) -> DcatqaResult<CountTable> {
    let body = endpoint.select_csv(query)?;
    let table = parse_counts(&body, metric)?;
    log::debug!("{metric}: {} contributor(s)", table.len());
    Ok(table)
}
