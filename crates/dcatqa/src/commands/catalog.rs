use clap::Parser;
use comfy_table::{presets, Row, Table};

use crate::catalog::{Category, Scope};
use crate::prelude::*;

/// Print the metrics evaluated by `dcatqa run`.
#[derive(Debug, Default, Parser)]
pub(crate) struct Catalog {
    /// Show only metrics counted on entries of this kind.
    #[arg(long, short)]
    scope: Option<Scope>,

    /// Show only metrics of this category.
    #[arg(long = "category", short = 'C')]
    category: Option<Category>,

    /// Include the SPARQL filter of each metric.
    #[arg(long)]
    filters: bool,
}

impl Catalog {
    pub(crate) fn execute(self, config: &Config) -> DcatqaResult<()> {
        let catalog = config.catalog()?;

        let mut header = vec!["name", "scope", "category", "description"];
        if self.filters {
            header.push("filter");
        }

        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(Row::from(header));

        let metrics = catalog
            .iter()
            .filter(|m| self.scope.map_or(true, |s| m.scope == s))
            .filter(|m| self.category.map_or(true, |c| m.category == c));

        for metric in metrics {
            let mut row = vec![
                metric.name.clone(),
                metric.scope.to_string(),
                metric.category.to_string(),
                metric.description.clone(),
            ];

            if self.filters {
                row.push(metric.filter.clone());
            }

            table.add_row(row);
        }

        println!("{table}");
        Ok(())
    }
}
