use crate::dataset::Dataset;
use std::collections::HashMap;
use std::sync::Arc;

/// Presentation collaborator (chart, table, report) fed with loaded datasets.
pub trait Sink: Send + Sync {
    fn present(&self, name: &str, dataset: &Dataset);
}

impl<F> Sink for F
where
    F: Fn(&str, &Dataset) + Send + Sync,
{
    fn present(&self, name: &str, dataset: &Dataset) {
        self(name, dataset)
    }
}

/// Sinks registered per logical dataset name.
#[derive(Clone, Default)]
pub struct SinkSet {
    by_name: HashMap<String, Vec<Arc<dyn Sink>>>,
    every: Vec<Arc<dyn Sink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, sink: Arc<dyn Sink>) -> &mut Self {
        self.by_name.entry(name.into()).or_default().push(sink);
        self
    }

    /// Register a sink that receives every dataset.
    pub fn register_all(&mut self, sink: Arc<dyn Sink>) -> &mut Self {
        self.every.push(sink);
        self
    }

    pub fn sinks_for<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Arc<dyn Sink>> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .chain(self.every.iter())
    }

    /// Call `present` once on each sink for `name`; returns how many were called.
    pub fn dispatch(&self, name: &str, dataset: &Dataset) -> usize {
        self.sinks_for(name)
            .map(|sink| sink.present(name, dataset))
            .count()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("SinkSet")
            .field("datasets", &names)
            .field("every", &self.every.len())
            .finish()
    }
}
