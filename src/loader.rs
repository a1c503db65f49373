//! Cascading dataset loader.
//!
//! Each logical dataset is tried tier by tier: primary source, optional
//! secondary source, then the compiled-in fallback. A failed tier is logged and
//! skipped; callers always get a dataset. Datasets of a view load concurrently
//! and each one reaches its sinks as soon as it resolves.

use crate::dataset::Dataset;
use crate::fallback::FallbackTable;
use crate::parse::parse;
use crate::registry::{ConfigError, DatasetDescriptor, Registry};
use crate::sink::SinkSet;
use crate::source::{RetrievalError, Source};
use futures::future::join_all;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Primary,
    Secondary,
    Fallback,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::Fallback => "fallback",
        }
    }

    fn source_tiers() -> [Tier; 2] {
        [Tier::Primary, Tier::Secondary]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Why a source tier did not serve its dataset.
#[derive(Debug, Error)]
pub enum TierFailure {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("no data rows")]
    Empty,
    #[error("missing columns {0:?}")]
    SchemaMismatch(Vec<String>),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("no fallback for dataset '{0}'")]
    MissingFallback(String),
}

#[derive(Debug)]
pub struct TierAttempt {
    pub tier: Tier,
    pub locator: String,
    pub failure: TierFailure,
}

/// A dataset together with the tier that served it.
#[derive(Debug)]
pub struct Loaded {
    pub dataset: Dataset,
    pub tier: Tier,
    pub locator: Option<String>,
    pub failures: Vec<TierAttempt>,
}

/// What happened to one dataset during [`Loader::load_view`]; the dataset itself
/// has already gone to the sinks.
#[derive(Debug)]
pub struct LoadReport {
    pub name: String,
    pub tier: Tier,
    pub locator: Option<String>,
    pub rows: usize,
    pub fingerprint: u32,
    pub failures: Vec<TierAttempt>,
    pub sinks: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Per source tier. `None` waits as long as the source does.
    pub timeout: Option<Duration>,
}

pub struct Loader {
    source: Arc<dyn Source>,
    registry: Registry,
    fallback: Arc<FallbackTable>,
    options: LoadOptions,
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("registry", &self.registry)
            .field("fallback_version", &self.fallback.version())
            .field("options", &self.options)
            .finish()
    }
}

impl Loader {
    /// Validate `registry` against `fallback` and build a loader over `source`.
    pub fn new(
        source: Arc<dyn Source>,
        registry: Registry,
        fallback: Arc<FallbackTable>,
    ) -> Result<Self, ConfigError> {
        registry.validate(&fallback)?;
        info!(
            datasets = registry.datasets.len(),
            views = registry.views.len(),
            fallback_version = fallback.version(),
            "loader ready"
        );
        Ok(Self {
            source,
            registry,
            fallback,
            options: LoadOptions::default(),
        })
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve one dataset through its cascade. Only an unknown name is an error.
    pub async fn load(&self, name: &str) -> Result<Loaded, LoadError> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| LoadError::UnknownDataset(name.to_string()))?;
        self.load_descriptor(descriptor).await
    }

    async fn load_descriptor(&self, d: &DatasetDescriptor) -> Result<Loaded, LoadError> {
        let mut failures = Vec::new();

        for (tier, locator) in Tier::source_tiers().into_iter().zip(d.locators()) {
            debug!(dataset = %d.name, %tier, locator, "trying tier");
            match self.attempt(d, locator).await {
                Ok(dataset) => {
                    info!(
                        dataset = %d.name,
                        %tier,
                        locator,
                        rows = dataset.len(),
                        fingerprint = %format!("{:08x}", dataset.fingerprint()),
                        "served"
                    );
                    return Ok(Loaded {
                        dataset,
                        tier,
                        locator: Some(locator.to_string()),
                        failures,
                    });
                }
                Err(failure) => {
                    warn!(dataset = %d.name, %tier, locator, error = %failure, "tier failed");
                    failures.push(TierAttempt {
                        tier,
                        locator: locator.to_string(),
                        failure,
                    });
                }
            }
        }

        let dataset = self
            .fallback
            .get(&d.name)
            .cloned()
            .ok_or_else(|| LoadError::MissingFallback(d.name.clone()))?;
        info!(
            dataset = %d.name,
            tier = %Tier::Fallback,
            version = self.fallback.version(),
            rows = dataset.len(),
            fingerprint = %format!("{:08x}", dataset.fingerprint()),
            "served"
        );
        Ok(Loaded {
            dataset,
            tier: Tier::Fallback,
            locator: None,
            failures,
        })
    }

    async fn attempt(&self, d: &DatasetDescriptor, locator: &str) -> Result<Dataset, TierFailure> {
        let text = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.fetch(locator))
                .await
                .map_err(|_| RetrievalError::TimedOut(limit))??,
            None => self.source.fetch(locator).await?,
        };

        let dataset = parse(&text);
        if dataset.is_empty() {
            return Err(TierFailure::Empty);
        }
        if d.strict {
            let missing = dataset.missing_columns(&d.columns);
            if !missing.is_empty() {
                return Err(TierFailure::SchemaMismatch(
                    missing.into_iter().map(str::to_string).collect(),
                ));
            }
        }
        Ok(dataset)
    }

    /// Load every dataset of `view` concurrently, dispatching each to `sinks` as
    /// soon as it resolves. Reports come back in view order.
    pub async fn load_view(&self, view: &str, sinks: &SinkSet) -> Result<Vec<LoadReport>, LoadError> {
        let members = self
            .registry
            .view(view)
            .ok_or_else(|| LoadError::UnknownView(view.to_string()))?;
        let names: Vec<&str> = members.iter().map(String::as_str).collect();
        self.load_names(&names, sinks).await
    }

    /// Load every registered dataset.
    pub async fn load_all(&self, sinks: &SinkSet) -> Vec<LoadReport> {
        let descriptors = self.registry.datasets.iter();
        join_all(descriptors.map(|d| self.load_and_dispatch(d, sinks)))
            .await
            .into_iter()
            .filter_map(|report| {
                report
                    .map_err(|err| warn!(error = %err, "dataset skipped"))
                    .ok()
            })
            .collect()
    }

    /// Load the named datasets. Unknown names fail the call before anything loads.
    /// A name listed twice is loaded and dispatched once.
    pub async fn load_names(&self, names: &[&str], sinks: &SinkSet) -> Result<Vec<LoadReport>, LoadError> {
        let mut seen = HashSet::new();
        let descriptors = names
            .iter()
            .filter(|n| seen.insert(**n))
            .map(|n| {
                self.registry
                    .get(n)
                    .ok_or_else(|| LoadError::UnknownDataset(n.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        join_all(descriptors.into_iter().map(|d| self.load_and_dispatch(d, sinks)))
            .await
            .into_iter()
            .collect()
    }

    async fn load_and_dispatch(
        &self,
        d: &DatasetDescriptor,
        sinks: &SinkSet,
    ) -> Result<LoadReport, LoadError> {
        let loaded = self.load_descriptor(d).await?;
        let sink_count = sinks.dispatch(&d.name, &loaded.dataset);
        Ok(LoadReport {
            name: d.name.clone(),
            tier: loaded.tier,
            locator: loaded.locator,
            rows: loaded.dataset.len(),
            fingerprint: loaded.dataset.fingerprint(),
            failures: loaded.failures,
            sinks: sink_count,
        })
    }
}
