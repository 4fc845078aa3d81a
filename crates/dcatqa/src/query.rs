//! Builds the SPARQL queries that count failing entries per
//! contributor.

use std::fmt::Write;

use crate::catalog::{MetricDefinition, Scope};

/// The namespace of DCAT-AP.de contributor identifiers.
pub(crate) const CONTRIBUTOR_NS: &str =
    "http://dcat-ap.de/def/contributors/";

/// The name of the column holding the number of entries per scope.
pub(crate) const TOTAL: &str = "total";

const PREFIXES: &str = "\
PREFIX dc: <http://purl.org/dc/elements/1.1/>
PREFIX dct: <http://purl.org/dc/terms/>
PREFIX dcatde: <http://dcat-ap.de/def/dcatde/>
PREFIX dcat: <http://www.w3.org/ns/dcat#>
PREFIX foaf: <http://xmlns.com/foaf/0.1/>
";

const COLLECTION: &str = "http://dcat-ap.de/def/datasetTypes/collection";

fn base_pattern(scope: Scope) -> String {
    let mut pattern = format!(
        "  ?dataset a dcat:Dataset .\n  \
           ?dataset dcatde:contributorID ?contributor .\n  \
           FILTER( regex(str(?contributor), \"^{CONTRIBUTOR_NS}\" ) )\n"
    );

    match scope {
        Scope::Distribution => {
            pattern.push_str(
                "  ?dataset dcat:distribution ?distribution .\n  \
                   ?distribution a dcat:Distribution .\n",
            );
        }
        Scope::Dataset => {
            let _ = writeln!(
                pattern,
                "  FILTER(NOT EXISTS {{ ?dataset dct:type <{COLLECTION}> }})"
            );
        }
    }

    pattern
}

/// Assembles the query counting the entries of `scope` per
/// contributor, restricted by `filter`.
///
/// The filter fragment is inserted verbatim into the `WHERE` block;
/// it must come from a trusted source.
pub(crate) fn build_query(
    scope: Scope,
    metric: &str,
    filter: &str,
) -> String {
    let var = scope.variable();
    let mut query = String::from(PREFIXES);

    let _ = writeln!(
        query,
        "SELECT ?contributor (COUNT(?{var}) AS ?{metric}) WHERE {{"
    );
    query.push_str(&base_pattern(scope));

    let filter = filter.trim();
    if !filter.is_empty() {
        let _ = writeln!(query, "  {filter}");
    }

    query.push_str("} GROUP BY ?contributor\n");
    query
}

/// Returns the query counting all entries of `scope`.
#[inline]
pub(crate) fn total_query(scope: Scope) -> String {
    build_query(scope, TOTAL, "")
}

/// Returns the query of a catalog entry.
#[inline]
pub(crate) fn metric_query(metric: &MetricDefinition) -> String {
    build_query(metric.scope, &metric.name, &metric.filter)
}
