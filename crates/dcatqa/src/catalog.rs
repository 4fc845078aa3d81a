use std::fmt::{self, Display};
use std::sync::LazyLock;

use clap::ValueEnum;
use hashbrown::HashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Column names every aggregate table carries besides its metrics.
pub(crate) const RESERVED: [&str; 2] = ["contributor", "total"];

static METRIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex")
});

/// The kind of catalog entry a metric is counted on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Scope {
    Dataset,
    Distribution,
}

impl Scope {
    /// Returns the SPARQL variable bound to the counted entry.
    #[inline]
    pub(crate) fn variable(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Distribution => "distribution",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variable())
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Category {
    Accessibility,
    Reusability,
    Contextuality,
    Findability,
    Interoperability,
    #[default]
    Other,
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Accessibility => "accessibility",
            Self::Reusability => "reusability",
            Self::Contextuality => "contextuality",
            Self::Findability => "findability",
            Self::Interoperability => "interoperability",
            Self::Other => "other",
        };

        write!(f, "{name}")
    }
}

/// A single quality criterion. The `filter` is a SPARQL fragment
/// selecting the entries that *fail* the criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct MetricDefinition {
    pub(crate) scope: Scope,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) category: Category,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub(crate) description: String,
    pub(crate) filter: String,
}

impl MetricDefinition {
    pub(crate) fn new<S: Into<String>>(
        scope: Scope,
        name: S,
        category: Category,
        description: S,
        filter: S,
    ) -> Self {
        Self {
            scope,
            name: name.into(),
            category,
            description: description.into(),
            filter: filter.into(),
        }
    }
}

/// The ordered, read-only list of metrics a run evaluates.
#[derive(Debug, Clone)]
pub(crate) struct Catalog {
    metrics: Vec<MetricDefinition>,
}

impl Catalog {
    /// Creates a catalog from the given definitions.
    ///
    /// Fails if a name isn't a valid SPARQL variable, collides with a
    /// reserved column or is used more than once.
    pub(crate) fn new(
        metrics: Vec<MetricDefinition>,
    ) -> DcatqaResult<Self> {
        {
            let mut seen = HashSet::new();

            for metric in metrics.iter() {
                let name = metric.name.as_str();
                if !METRIC_NAME.is_match(name) {
                    return Err(DcatqaError::schema(format!(
                        "invalid metric name `{name}`"
                    )));
                }

                if RESERVED.contains(&name) {
                    return Err(DcatqaError::schema(format!(
                        "metric name `{name}` is reserved"
                    )));
                }

                if !seen.insert(name) {
                    return Err(DcatqaError::schema(format!(
                        "duplicate metric `{name}`"
                    )));
                }
            }
        }

        Ok(Self { metrics })
    }

    /// Returns the built-in catalog followed by `extra` definitions.
    pub(crate) fn with_extra(
        extra: Vec<MetricDefinition>,
    ) -> DcatqaResult<Self> {
        let mut metrics = builtin();
        metrics.extend(extra);
        Self::new(metrics)
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.metrics.iter()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.metrics.len()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&MetricDefinition> {
        self.metrics.iter().find(|metric| metric.name == name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            metrics: builtin(),
        }
    }
}

/// The built-in metrics, grouped by category.
pub(crate) fn builtin() -> Vec<MetricDefinition> {
    use Category::*;
    use Scope::*;

    vec![
        MetricDefinition::new(
            Distribution,
            "accessibility_download",
            Accessibility,
            "distribution without download URL",
            "FILTER(NOT EXISTS { ?distribution dcat:downloadURL ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "reusability_access_rights",
            Reusability,
            "dataset without access rights",
            "FILTER(NOT EXISTS { ?dataset dct:accessRights ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "reusability_license_information",
            Reusability,
            "distribution without license",
            "FILTER(NOT EXISTS { ?distribution dct:license ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "reusability_access_rights_vocabulary",
            Reusability,
            "access rights not taken from the EU vocabulary",
            "OPTIONAL { ?dataset dct:accessRights ?rights } . \
             FILTER( !regex(str(?rights), \
             \"^http://publications.europa.eu/resource/authority/access-right/\" ) )",
        ),
        MetricDefinition::new(
            Dataset,
            "reusability_contact",
            Reusability,
            "dataset without contact point",
            "FILTER(NOT EXISTS { ?dataset dcat:contactPoint ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "reusability_publisher",
            Reusability,
            "dataset without publisher",
            "FILTER(NOT EXISTS { ?dataset dct:publisher ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "contextuality_rights",
            Contextuality,
            "dataset without rights statement",
            "FILTER(NOT EXISTS { ?dataset dct:rights ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "contextuality_dataset_modified",
            Contextuality,
            "dataset without modification date",
            "FILTER(NOT EXISTS { ?dataset dct:modified ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "contextuality_dataset_issued",
            Contextuality,
            "dataset without issue date",
            "FILTER(NOT EXISTS { ?dataset dct:issued ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "contextuality_distribution_modified",
            Contextuality,
            "distribution without modification date",
            "FILTER(NOT EXISTS { ?distribution dct:modified ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "contextuality_distribution_issued",
            Contextuality,
            "distribution without issue date",
            "FILTER(NOT EXISTS { ?distribution dct:issued ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "contextuality_file_size",
            Contextuality,
            "distribution without byte size",
            "FILTER(NOT EXISTS { ?distribution dcat:byteSize ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "findability_keyword",
            Findability,
            "dataset without keywords",
            "FILTER(NOT EXISTS { ?dataset dcat:keyword ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "findability_category",
            Findability,
            "dataset without theme",
            "FILTER(NOT EXISTS { ?dataset dcat:theme ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "findability_geo",
            Findability,
            "dataset without spatial coverage",
            "FILTER(NOT EXISTS { ?dataset dct:spatial ?x. })",
        ),
        MetricDefinition::new(
            Dataset,
            "findability_time",
            Findability,
            "dataset without temporal coverage",
            "FILTER(NOT EXISTS { ?dataset dct:temporal ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "interoperability_format",
            Interoperability,
            "distribution without format",
            "FILTER(NOT EXISTS { ?distribution dct:format ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "interoperability_media_type",
            Interoperability,
            "distribution without media type",
            "FILTER(NOT EXISTS { ?distribution dcat:mediaType ?x. })",
        ),
        MetricDefinition::new(
            Distribution,
            "interoperability_format_from_vocabulary",
            Interoperability,
            "format not taken from the EU file type vocabulary",
            "OPTIONAL { ?distribution dct:format ?format }. \
             FILTER( !regex(str(?format), \
             \"^http://publications.europa.eu/resource/authority/file-type/\" ))",
        ),
        MetricDefinition::new(
            Distribution,
            "interoperability_media_type_from_vocabulary",
            Interoperability,
            "format not taken from the IANA media types",
            "OPTIONAL { ?distribution dct:format ?format } . \
             FILTER( !regex(str(?format), \
             \"^https://www.iana.org/assignments/media-types/\" ))",
        ),
        MetricDefinition::new(
            Distribution,
            "other_2licenses",
            Other,
            "distribution with two different licenses",
            "?distribution dct:license ?a . \
             ?distribution dct:license ?b . FILTER( ?a != ?b )",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    fn metric(name: &str) -> MetricDefinition {
        MetricDefinition::new(
            Scope::Dataset,
            name,
            Category::Other,
            "",
            "FILTER(NOT EXISTS { ?dataset dct:title ?x. })",
        )
    }

    #[test]
    fn builtin_catalog() -> TestResult {
        let catalog = Catalog::with_extra(vec![])?;
        assert_eq!(catalog.len(), 21);

        let first = catalog.iter().next().unwrap();
        assert_eq!(first.name, "accessibility_download");
        assert_eq!(first.scope, Scope::Distribution);

        let datasets = catalog
            .iter()
            .filter(|m| m.scope == Scope::Dataset)
            .count();
        assert_eq!(datasets, 11);
        Ok(())
    }

    #[test]
    fn catalog_get() {
        let catalog = Catalog::default();
        let metric = catalog.get("findability_time").unwrap();
        assert_eq!(metric.scope, Scope::Dataset);
        assert_eq!(metric.category, Category::Findability);
        assert!(catalog.get("findability_foo").is_none());
    }

    #[test]
    fn catalog_extra_appended() -> TestResult {
        let catalog = Catalog::with_extra(vec![metric("other_title")])?;
        assert_eq!(catalog.len(), 22);
        assert_eq!(catalog.iter().last().unwrap().name, "other_title");
        Ok(())
    }

    #[test]
    fn catalog_rejects_invalid_names() {
        assert!(Catalog::new(vec![metric("has space")]).is_err());
        assert!(Catalog::new(vec![metric("1st")]).is_err());
        assert!(Catalog::new(vec![metric("x}")]).is_err());
        assert!(Catalog::new(vec![metric("total")]).is_err());
        assert!(Catalog::new(vec![metric("contributor")]).is_err());
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let result = Catalog::with_extra(vec![metric("findability_geo")]);
        assert!(matches!(result, Err(DcatqaError::Schema(_))));
    }

    #[test]
    fn scope_to_string() {
        assert_eq!(Scope::Dataset.to_string(), "dataset");
        assert_eq!(Scope::Distribution.to_string(), "distribution");
        assert_eq!(Category::Findability.to_string(), "findability");
    }
}
