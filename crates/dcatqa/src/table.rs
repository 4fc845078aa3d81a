use std::collections::btree_map::{self, BTreeMap};

use hashbrown::HashMap;

use crate::catalog::{Scope, RESERVED};
use crate::prelude::*;

/// The result of a single metric query: a count per contributor.
///
/// Contributors are unique and kept in ascending order; adding a
/// contributor twice sums up both counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CountTable {
    metric: String,
    counts: BTreeMap<String, u64>,
}

impl CountTable {
    pub(crate) fn new<S: Into<String>>(metric: S) -> Self {
        Self {
            metric: metric.into(),
            counts: BTreeMap::new(),
        }
    }

    #[inline]
    pub(crate) fn metric(&self) -> &str {
        &self.metric
    }

    pub(crate) fn add<S: Into<String>>(
        &mut self,
        contributor: S,
        count: u64,
    ) {
        *self.counts.entry(contributor.into()).or_default() += count;
    }

    #[inline]
    pub(crate) fn get(&self, contributor: &str) -> Option<u64> {
        self.counts.get(contributor).copied()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub(crate) fn iter(&self) -> btree_map::Iter<'_, String, u64> {
        self.counts.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AggregateRow {
    pub(crate) contributor: String,
    pub(crate) total: u64,
    pub(crate) values: Vec<Option<u64>>,
}

/// A wide table with one row per contributor of a scope: the total
/// number of entries followed by one count per merged metric.
///
/// The contributor set is fixed by the totals the table is created
/// from; merged metrics never add rows.
#[derive(Debug, Clone)]
pub(crate) struct AggregateTable {
    scope: Scope,
    columns: Vec<String>,
    rows: Vec<AggregateRow>,
    index: HashMap<String, usize>,
}

impl AggregateTable {
    /// Creates a table with a row for every contributor in `totals`.
    pub(crate) fn from_totals(scope: Scope, totals: CountTable) -> Self {
        let mut rows = Vec::with_capacity(totals.len());
        let mut index = HashMap::with_capacity(totals.len());

        for (contributor, total) in totals.counts.into_iter() {
            index.insert(contributor.clone(), rows.len());
            rows.push(AggregateRow {
                contributor,
                total,
                values: vec![],
            });
        }

        Self {
            scope,
            columns: vec![],
            rows,
            index,
        }
    }

    #[inline]
    pub(crate) fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the metric columns in merge order (without `total`).
    #[inline]
    pub(crate) fn columns(&self) -> &[String] {
        &self.columns
    }

    #[inline]
    pub(crate) fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    #[inline]
    pub(crate) fn height(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub(crate) fn get(&self, contributor: &str) -> Option<&AggregateRow> {
        self.index.get(contributor).map(|idx| &self.rows[*idx])
    }

    /// Returns the cell of `column` for the given contributor; `None`
    /// if either is unknown.
    #[cfg(test)]
    pub(crate) fn value(
        &self,
        contributor: &str,
        column: &str,
    ) -> Option<Option<u64>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.get(contributor).map(|row| row.values[idx])
    }

    /// Left-merges `counts` as a new column keyed on contributor.
    ///
    /// Rows missing in `counts` get an unset cell. Contributors unknown
    /// to this table are dropped. A column name that is already taken
    /// is rejected.
    pub(crate) fn left_merge(
        mut self,
        counts: CountTable,
    ) -> DcatqaResult<Self> {
        let name = counts.metric();
        if RESERVED.contains(&name)
            || self.columns.iter().any(|c| c == name)
        {
            return Err(DcatqaError::schema(format!(
                "column `{name}` already exists in the {} table",
                self.scope
            )));
        }

        let dropped = counts
            .iter()
            .filter(|(contributor, _)| {
                !self.index.contains_key(contributor.as_str())
            })
            .count();

        if dropped > 0 {
            log::debug!(
                "{name}: dropped {dropped} contributor(s) without {}s",
                self.scope
            );
        }

        for row in self.rows.iter_mut() {
            row.values.push(counts.get(&row.contributor));
        }

        self.columns.push(counts.metric);
        Ok(self)
    }

    /// Sets every unset cell to 0.
    pub(crate) fn fill_missing(mut self) -> Self {
        for row in self.rows.iter_mut() {
            for value in row.values.iter_mut() {
                value.get_or_insert(0);
            }
        }

        self
    }

    /// Returns `true` if no cell is unset.
    pub(crate) fn is_filled(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.values.iter().all(Option::is_some))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelativeRow {
    pub(crate) contributor: String,
    pub(crate) values: Vec<Option<f64>>,
}

/// The share of entries passing each criterion, per contributor. A
/// `None` cell marks an undefined ratio (no entries at all).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelativeTable {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<RelativeRow>,
}

impl RelativeTable {
    #[cfg(test)]
    pub(crate) fn value(
        &self,
        contributor: &str,
        column: &str,
    ) -> Option<Option<f64>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.contributor == contributor)
            .map(|row| row.values[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    fn counts(metric: &str, rows: &[(&str, u64)]) -> CountTable {
        let mut table = CountTable::new(metric);
        for (contributor, count) in rows {
            table.add(*contributor, *count);
        }

        table
    }

    #[test]
    fn count_table_sums_duplicates() {
        let table = counts("x", &[("b", 1), ("a", 2), ("b", 3)]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(2));
        assert_eq!(table.get("b"), Some(4));
        assert_eq!(table.get("c"), None);

        let keys: Vec<&str> =
            table.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn from_totals() {
        let table = AggregateTable::from_totals(
            Scope::Dataset,
            counts("total", &[("B", 5), ("A", 10)]),
        );

        assert_eq!(table.height(), 2);
        assert!(table.columns().is_empty());
        assert_eq!(table.rows()[0].contributor, "A");
        assert_eq!(table.get("B").unwrap().total, 5);
    }

    #[test]
    fn left_merge_keeps_base_contributors() -> TestResult {
        let table = AggregateTable::from_totals(
            Scope::Dataset,
            counts("total", &[("A", 10), ("B", 5)]),
        )
        .left_merge(counts("m1", &[("A", 2), ("C", 7)]))?;

        assert_eq!(table.height(), 2);
        assert!(table.get("C").is_none());
        assert_eq!(table.value("A", "m1"), Some(Some(2)));
        assert_eq!(table.value("B", "m1"), Some(None));
        assert!(!table.is_filled());
        Ok(())
    }

    #[test]
    fn merge_monotonicity() -> TestResult {
        for n in 0..5 {
            let mut table = AggregateTable::from_totals(
                Scope::Distribution,
                counts("total", &[("A", 3), ("B", 4), ("C", 0)]),
            );

            for i in 0..n {
                let metric = format!("m{i}");
                table = table.left_merge(counts(&metric, &[("B", 1)]))?;
            }

            assert_eq!(table.height(), 3);
            assert_eq!(table.columns().len() + 1, n + 1);
            assert!(table.rows().iter().all(|r| r.values.len() == n));
        }

        Ok(())
    }

    #[test]
    fn fill_law() -> TestResult {
        let table = AggregateTable::from_totals(
            Scope::Dataset,
            counts("total", &[("A", 10), ("B", 5)]),
        )
        .left_merge(counts("m1", &[("A", 2)]))?
        .left_merge(counts("m2", &[]))?
        .fill_missing();

        assert!(table.is_filled());
        assert_eq!(table.value("A", "m1"), Some(Some(2)));
        assert_eq!(table.value("B", "m1"), Some(Some(0)));
        assert_eq!(table.value("A", "m2"), Some(Some(0)));
        assert_eq!(table.value("B", "m2"), Some(Some(0)));
        Ok(())
    }

    #[test]
    fn left_merge_rejects_collisions() -> TestResult {
        let table = AggregateTable::from_totals(
            Scope::Dataset,
            counts("total", &[("A", 1)]),
        )
        .left_merge(counts("m1", &[]))?;

        let result = table.clone().left_merge(counts("m1", &[]));
        assert!(matches!(result, Err(DcatqaError::Schema(_))));

        let result = table.left_merge(counts("total", &[]));
        assert!(matches!(result, Err(DcatqaError::Schema(_))));
        Ok(())
    }
}
