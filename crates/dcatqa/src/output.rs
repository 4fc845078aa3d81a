use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::prelude::*;
use crate::table::{AggregateTable, RelativeTable};

pub(crate) const DATASETS: &str = "datasets.csv";
pub(crate) const DISTRIBUTIONS: &str = "distributions.csv";
pub(crate) const RELATIVE: &str = "relative.csv";

/// Converts an aggregate into a frame with a leading row index.
pub(crate) fn aggregate_frame(
    table: &AggregateTable,
) -> DcatqaResult<DataFrame> {
    let rows = table.rows();
    let mut series = Vec::with_capacity(table.columns().len() + 3);

    series.push(Series::new(
        "",
        (0..rows.len() as u64).collect::<Vec<_>>(),
    ));
    series.push(Series::new(
        "contributor",
        rows.iter()
            .map(|row| row.contributor.as_str())
            .collect::<Vec<_>>(),
    ));
    series.push(Series::new(
        "total",
        rows.iter().map(|row| row.total).collect::<Vec<_>>(),
    ));

    for (idx, name) in table.columns().iter().enumerate() {
        let values = rows
            .iter()
            .map(|row| row.values[idx].unwrap_or_default())
            .collect::<Vec<u64>>();

        series.push(Series::new(name.as_str(), values));
    }

    Ok(DataFrame::new(series)?)
}

/// Converts the relative metrics into a frame indexed by contributor.
pub(crate) fn relative_frame(
    table: &RelativeTable,
) -> DcatqaResult<DataFrame> {
    let mut series = Vec::with_capacity(table.columns.len() + 1);
    series.push(Series::new(
        "contributor",
        table
            .rows
            .iter()
            .map(|row| row.contributor.as_str())
            .collect::<Vec<_>>(),
    ));

    for (idx, name) in table.columns.iter().enumerate() {
        let values = table
            .rows
            .iter()
            .map(|row| row.values[idx])
            .collect::<Vec<Option<f64>>>();

        series.push(Series::new(name.as_str(), values));
    }

    Ok(DataFrame::new(series)?)
}

/// Writes `df` as CSV; null cells are written as `missing_marker`.
pub(crate) fn write_csv<W: Write>(
    writer: W,
    df: &mut DataFrame,
    missing_marker: &str,
) -> DcatqaResult<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_null_value(missing_marker.to_string())
        .finish(df)?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `datasets.csv`, `distributions.csv` and `relative.csv` into
/// `dir`.
///
/// The files are written under temporary names first and only renamed
/// once all of them have been written, so a failed write leaves the
/// directory untouched. If a rename fails, the files renamed before it
/// stay in place and the remaining temporary files are removed.
pub(crate) fn write_tables(
    dir: &Path,
    datasets: &AggregateTable,
    distributions: &AggregateTable,
    relative: &RelativeTable,
    missing_marker: &str,
) -> DcatqaResult<()> {
    let mut frames = [
        (dir.join(DISTRIBUTIONS), aggregate_frame(distributions)?),
        (dir.join(DATASETS), aggregate_frame(datasets)?),
        (dir.join(RELATIVE), relative_frame(relative)?),
    ];

    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let result = frames.iter_mut().try_for_each(
        |(path, df)| -> DcatqaResult<()> {
            let file = File::create(temp_path(path))?;
            write_csv(file, df, missing_marker)
        },
    );

    if let Err(e) = result {
        remove_temp_files(frames.iter().map(|(path, _)| path));
        return Err(e);
    }

    for (idx, (path, _)) in frames.iter().enumerate() {
        if let Err(e) = fs::rename(temp_path(path), path) {
            remove_temp_files(frames[idx..].iter().map(|(path, _)| path));
            return Err(e.into());
        }

        log::info!("wrote {}", path.display());
    }

    Ok(())
}

fn remove_temp_files<'a, I>(paths: I)
where
    I: Iterator<Item = &'a PathBuf>,
{
    for path in paths {
        let _ = fs::remove_file(temp_path(path));
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::catalog::Scope;
    use crate::table::{CountTable, RelativeRow};

    type TestResult = anyhow::Result<()>;

    fn datasets() -> DcatqaResult<AggregateTable> {
        let mut totals = CountTable::new("total");
        totals.add("A", 10);
        totals.add("B", 5);

        let mut counts = CountTable::new("reusability_access_rights");
        counts.add("A", 2);

        Ok(AggregateTable::from_totals(Scope::Dataset, totals)
            .left_merge(counts)?
            .fill_missing())
    }

    fn relative() -> RelativeTable {
        RelativeTable {
            columns: vec!["m".into()],
            rows: vec![
                RelativeRow {
                    contributor: "A".into(),
                    values: vec![Some(0.5)],
                },
                RelativeRow {
                    contributor: "B".into(),
                    values: vec![None],
                },
            ],
        }
    }

    #[test]
    fn aggregate_frame_shape() -> TestResult {
        let df = aggregate_frame(&datasets()?)?;
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(
            df.get_column_names(),
            vec!["", "contributor", "total", "reusability_access_rights"]
        );
        Ok(())
    }

    #[test]
    fn write_aggregate_csv() -> TestResult {
        let mut df = aggregate_frame(&datasets()?)?;
        let mut buf = Vec::new();
        write_csv(&mut buf, &mut df, "")?;

        let content = String::from_utf8(buf)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0]
            .ends_with("contributor,total,reusability_access_rights"));
        assert_eq!(lines[1], "0,A,10,2");
        assert_eq!(lines[2], "1,B,5,0");
        Ok(())
    }

    #[test]
    fn write_relative_csv() -> TestResult {
        let mut df = relative_frame(&relative())?;
        assert_eq!(df.shape(), (2, 2));

        let mut buf = Vec::new();
        write_csv(&mut buf, &mut df, "NaN")?;

        let content = String::from_utf8(buf)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["contributor,m", "A,0.5", "B,NaN"]);
        Ok(())
    }

    #[test]
    fn write_tables_to_dir() -> TestResult {
        let dir = env::temp_dir()
            .join(format!("dcatqa-output-{}", std::process::id()));

        let datasets = datasets()?;
        let distributions = AggregateTable::from_totals(
            Scope::Distribution,
            CountTable::new("total"),
        );

        write_tables(&dir, &datasets, &distributions, &relative(), "")?;

        for name in [DATASETS, DISTRIBUTIONS, RELATIVE] {
            assert!(dir.join(name).is_file());
            assert!(!temp_path(&dir.join(name)).exists());
        }

        let content = fs::read_to_string(dir.join(RELATIVE))?;
        assert!(content.contains("\nB,\n"));

        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn failed_rename_removes_temp_files() -> TestResult {
        let dir = env::temp_dir()
            .join(format!("dcatqa-rename-{}", std::process::id()));

        // a non-empty directory can't be replaced by a file
        fs::create_dir_all(dir.join(RELATIVE))?;
        fs::write(dir.join(RELATIVE).join("keep"), "")?;

        let datasets = datasets()?;
        let distributions = AggregateTable::from_totals(
            Scope::Distribution,
            CountTable::new("total"),
        );

        let result =
            write_tables(&dir, &datasets, &distributions, &relative(), "");
        assert!(matches!(result, Err(DcatqaError::IO(_))));

        for name in [DATASETS, DISTRIBUTIONS, RELATIVE] {
            assert!(!temp_path(&dir.join(name)).exists());
        }

        assert!(dir.join(RELATIVE).join("keep").is_file());

        fs::remove_dir_all(dir)?;
        Ok(())
    }
}
