//! Last-resort datasets compiled into the binary.

use crate::dataset::Dataset;
use crate::parse::parse;
use std::collections::BTreeMap;

/// Bumped whenever a file under `data/fallback/` changes.
pub const BUILTIN_VERSION: &str = "2024.2";

const BUILTIN: &[(&str, &str)] = &[
    ("summary", include_str!("../data/fallback/summary.csv")),
    (
        "demographics_gender",
        include_str!("../data/fallback/demographics_gender.csv"),
    ),
    (
        "demographics_education",
        include_str!("../data/fallback/demographics_education.csv"),
    ),
    ("age_stats", include_str!("../data/fallback/age_stats.csv")),
    ("descriptive", include_str!("../data/fallback/descriptive.csv")),
    ("reliability", include_str!("../data/fallback/reliability.csv")),
    ("centrality", include_str!("../data/fallback/centrality.csv")),
    (
        "percentile_norms",
        include_str!("../data/fallback/percentile_norms.csv"),
    ),
    ("t_scores", include_str!("../data/fallback/t_scores.csv")),
];

/// Read-only mapping from logical dataset name to its compiled-in dataset.
///
/// Built once at startup and shared with the loader; nothing mutates it after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackTable {
    version: String,
    datasets: BTreeMap<String, Dataset>,
}

impl FallbackTable {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            datasets: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        BUILTIN
            .iter()
            .fold(Self::new(BUILTIN_VERSION), |table, (name, text)| {
                table.with(*name, parse(text))
            })
    }

    pub fn with(mut self, name: impl Into<String>, dataset: Dataset) -> Self {
        self.datasets.insert(name.into(), dataset);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn builtin_table_matches_builtin_registry() {
        let table = FallbackTable::builtin();
        assert_eq!(table.version(), BUILTIN_VERSION);
        Registry::builtin().validate(&table).unwrap();
        assert!(table.iter().all(|(_, ds)| !ds.is_empty()));
    }

    #[test]
    fn builtin_reliability_covers_fifteen_aspects() {
        let table = FallbackTable::builtin();
        let rel = table.get("reliability").unwrap();
        assert_eq!(rel.len(), 15);
        assert_eq!(rel.rows()[0].get("Aspek"), Some("Achievement"));
        assert_eq!(rel.rows()[14].get("Omega"), Some("0.817"));
    }
}
