use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::{Catalog, MetricDefinition};
use crate::prelude::*;

/// The SPARQL endpoint of GovData.
pub(crate) const DEFAULT_ENDPOINT: &str = "https://www.govdata.de/sparql";

/// The request timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT: u64 = 300;

/// dcatqa config.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// The URL of the SPARQL endpoint.
    pub(crate) endpoint: Option<Url>,

    /// Request timeout in seconds.
    pub(crate) timeout: Option<u64>,

    /// The value written for undefined ratios.
    pub(crate) missing_marker: Option<String>,

    /// Whether to skip contributors that have distributions, but no
    /// datasets.
    #[serde(default)]
    pub(crate) lenient: bool,

    /// Runtime options.
    pub(crate) runtime: Option<Runtime>,

    /// Additional metrics evaluated after the built-in ones.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub(crate) metrics: Vec<MetricDefinition>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Runtime {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    pub(crate) num_jobs: Option<usize>,
}

impl Config {
    pub(crate) const FILENAME: &'static str = "dcatqa.toml";

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> DcatqaResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().into();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = path;

        Ok(config)
    }

    /// Searches the current directory and its parents for a config
    /// file. Returns the default config if there is none.
    pub(crate) fn discover() -> DcatqaResult<Self> {
        let mut dir = env::current_dir()?;

        loop {
            let path = dir.join(Self::FILENAME);
            if path.is_file() {
                return Self::from_path(path);
            }

            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Returns the file the config was loaded from, if any.
    pub(crate) fn path(&self) -> Option<&Path> {
        if self.path.as_os_str().is_empty() {
            None
        } else {
            Some(&self.path)
        }
    }

    pub(crate) fn endpoint(&self) -> DcatqaResult<Url> {
        match self.endpoint {
            Some(ref url) => Ok(url.clone()),
            None => Url::parse(DEFAULT_ENDPOINT)
                .map_err(|e| DcatqaError::Other(e.to_string())),
        }
    }

    #[inline]
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }

    #[inline]
    pub(crate) fn missing_marker(&self) -> &str {
        self.missing_marker.as_deref().unwrap_or_default()
    }

    #[inline]
    pub(crate) fn num_jobs(&self) -> Option<usize> {
        self.runtime.as_ref().and_then(|rt| rt.num_jobs)
    }

    /// Returns the built-in catalog extended by the configured
    /// metrics.
    pub(crate) fn catalog(&self) -> DcatqaResult<Catalog> {
        Catalog::with_extra(self.metrics.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Scope};

    type TestResult = anyhow::Result<()>;

    #[test]
    fn default_config() -> TestResult {
        let config = Config::default();
        assert_eq!(config.endpoint()?.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.missing_marker(), "");
        assert_eq!(config.num_jobs(), None);
        assert!(!config.lenient);
        assert!(config.path().is_none());
        assert_eq!(config.catalog()?.len(), 21);
        Ok(())
    }

    #[test]
    fn parse_config() -> TestResult {
        let config: Config = toml::from_str(
            r#"
            endpoint = "http://localhost:8890/sparql"
            timeout = 10
            missing-marker = "NaN"
            lenient = true

            [runtime]
            num-jobs = 4

            [[metrics]]
            scope = "dataset"
            name = "other_title"
            category = "findability"
            filter = "FILTER(NOT EXISTS { ?dataset dct:title ?x. })"
            "#,
        )?;

        assert_eq!(
            config.endpoint()?.as_str(),
            "http://localhost:8890/sparql"
        );
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.missing_marker(), "NaN");
        assert_eq!(config.num_jobs(), Some(4));
        assert!(config.lenient);

        let catalog = config.catalog()?;
        assert_eq!(catalog.len(), 22);

        let metric = catalog.get("other_title").unwrap();
        assert_eq!(metric.scope, Scope::Dataset);
        assert_eq!(metric.category, Category::Findability);
        assert!(metric.description.is_empty());
        Ok(())
    }

    #[test]
    fn invalid_metric_name() -> TestResult {
        let config: Config = toml::from_str(
            r#"
            [[metrics]]
            scope = "distribution"
            name = "findability_geo"
            filter = ""
            "#,
        )?;

        assert!(config.catalog().is_err());
        Ok(())
    }

    #[test]
    fn invalid_scope() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [[metrics]]
            scope = "catalog"
            name = "x"
            filter = ""
            "#,
        );

        assert!(result.is_err());
    }
}
