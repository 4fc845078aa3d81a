pub(crate) use catalog::Catalog;
pub(crate) use completions::Completions;
pub(crate) use query::Query;
pub(crate) use run::Run;

mod catalog;
mod completions;
mod query;
mod run;
