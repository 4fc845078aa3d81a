use hashbrown::HashSet;

use crate::catalog::Scope;
use crate::prelude::*;
use crate::table::{
    AggregateRow, AggregateTable, RelativeRow, RelativeTable,
};

/// Returns the share of entries passing a criterion, `1 - count/total`,
/// or `None` if there are no entries.
#[inline]
pub(crate) fn ratio(count: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }

    Some(1.0 - count as f64 / total as f64)
}

fn ratios(row: Option<&AggregateRow>, width: usize) -> Vec<Option<f64>> {
    match row {
        Some(row) => row
            .values
            .iter()
            .map(|value| ratio(value.unwrap_or_default(), row.total))
            .collect(),
        None => vec![None; width],
    }
}

fn check_filled(table: &AggregateTable) -> DcatqaResult<()> {
    if !table.is_filled() {
        return Err(DcatqaError::schema(format!(
            "the {} table contains unset cells",
            table.scope()
        )));
    }

    Ok(())
}

/// Combines both aggregates into a table of relative metrics.
///
/// The rows are the contributors of `datasets`; the columns are the
/// distribution metrics followed by the dataset metrics. Contributors
/// without distributions get undefined distribution ratios. A
/// contributor that only has distributions is an error, unless
/// `lenient` is set, in which case it is skipped.
pub(crate) fn compute_relative(
    datasets: &AggregateTable,
    distributions: &AggregateTable,
    lenient: bool,
) -> DcatqaResult<RelativeTable> {
    if datasets.scope() != Scope::Dataset
        || distributions.scope() != Scope::Distribution
    {
        return Err(DcatqaError::schema("unexpected table scopes"));
    }

    check_filled(datasets)?;
    check_filled(distributions)?;

    let mut seen: HashSet<&str> = distributions
        .columns()
        .iter()
        .map(String::as_str)
        .collect();

    for column in datasets.columns() {
        if !seen.insert(column.as_str()) {
            return Err(DcatqaError::schema(format!(
                "column `{column}` exists in both tables"
            )));
        }
    }

    let mut columns: Vec<String> = distributions.columns().to_vec();
    columns.extend(datasets.columns().iter().cloned());

    let orphans: Vec<&str> = distributions
        .rows()
        .iter()
        .map(|row| row.contributor.as_str())
        .filter(|contributor| datasets.get(contributor).is_none())
        .collect();

    if !orphans.is_empty() {
        if !lenient {
            return Err(DcatqaError::schema(format!(
                "contributor(s) without datasets: {}",
                orphans.join(", ")
            )));
        }

        log::warn!(
            "skipping {} contributor(s) without datasets: {}",
            orphans.len(),
            orphans.join(", ")
        );
    }

    let width = distributions.columns().len();
    let rows = datasets
        .rows()
        .iter()
        .map(|row| {
            let mut values =
                ratios(distributions.get(&row.contributor), width);
            values.extend(ratios(Some(row), datasets.columns().len()));

            RelativeRow {
                contributor: row.contributor.clone(),
                values,
            }
        })
        .collect();

    Ok(RelativeTable { columns, rows })
}
