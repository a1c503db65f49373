//! Which datasets a dashboard needs and where each one lives.

use crate::fallback::FallbackTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading registry {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing registry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset '{0}' is declared more than once")]
    DuplicateDataset(String),
    #[error("dataset '{0}' has no fallback entry")]
    MissingFallback(String),
    #[error("fallback for '{name}' lacks declared columns: {missing:?}")]
    FallbackSchema { name: String, missing: Vec<String> },
    #[error("view '{view}' references unknown dataset '{dataset}'")]
    UnknownViewDataset { view: String, dataset: String },
    #[error("view '{view}' lists dataset '{dataset}' more than once")]
    RepeatedViewDataset { view: String, dataset: String },
}

/// Where one logical dataset is fetched from, and what it should look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDescriptor {
    pub name: String,
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    /// Expected columns. Checked against the fallback entry at startup.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    /// When set, a live tier missing any of `columns` is treated as failed.
    #[serde(default)]
    pub strict: bool,
}

impl DatasetDescriptor {
    pub fn new(name: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: primary.into(),
            secondary: None,
            columns: Vec::new(),
            strict: false,
        }
    }

    pub fn secondary(mut self, locator: impl Into<String>) -> Self {
        self.secondary = Some(locator.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Source locators in cascade order.
    pub fn locators(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.secondary.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub datasets: Vec<DatasetDescriptor>,
    #[serde(default)]
    pub views: BTreeMap<String, Vec<String>>,
}

impl Registry {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn get(&self, name: &str) -> Option<&DatasetDescriptor> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&[String]> {
        self.views.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.iter().map(|d| d.name.as_str())
    }

    /// Check that every tier of every dataset can be served consistently.
    pub fn validate(&self, fallback: &FallbackTable) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for d in &self.datasets {
            if !seen.insert(d.name.as_str()) {
                return Err(ConfigError::DuplicateDataset(d.name.clone()));
            }
            let table = fallback
                .get(&d.name)
                .ok_or_else(|| ConfigError::MissingFallback(d.name.clone()))?;
            let missing = table.missing_columns(&d.columns);
            if !missing.is_empty() {
                return Err(ConfigError::FallbackSchema {
                    name: d.name.clone(),
                    missing: missing.into_iter().map(str::to_string).collect(),
                });
            }
        }
        for (view, members) in &self.views {
            if let Some(dataset) = members.iter().find(|m| !seen.contains(m.as_str())) {
                return Err(ConfigError::UnknownViewDataset {
                    view: view.clone(),
                    dataset: dataset.clone(),
                });
            }
            let mut listed = HashSet::new();
            if let Some(dataset) = members.iter().find(|m| !listed.insert(m.as_str())) {
                return Err(ConfigError::RepeatedViewDataset {
                    view: view.clone(),
                    dataset: dataset.clone(),
                });
            }
        }
        Ok(())
    }

    /// Datasets of the survey dashboard, with the table paths it publishes.
    pub fn builtin() -> Self {
        let datasets = vec![
            DatasetDescriptor::new("summary", "tables/00_Summary_Analisis.csv")
                .columns(["Metrik", "Nilai"]),
            DatasetDescriptor::new("demographics_gender", "tables/01_Demografis_JenisKelamin.csv")
                .columns(["Kategori", "Frekuensi", "Persentase.Freq"]),
            DatasetDescriptor::new("demographics_education", "tables/01_Demografis_Pendidikan.csv")
                .columns(["Kategori", "Frekuensi", "Persentase.Freq"]),
            DatasetDescriptor::new("age_stats", "tables/01_Statistik_Usia.csv")
                .columns(["Mean", "SD", "Min", "Max"]),
            DatasetDescriptor::new("descriptive", "tables/02_Deskriptif_Aspek.csv")
                .secondary("tables/35_Statistik_Deskriptif_Lengkap.csv")
                .columns(["Aspek", "n", "mean", "sd"]),
            DatasetDescriptor::new("reliability", "tables/02_Reliabilitas_Aspek.csv")
                .secondary("tables/03_Reliabilitas.csv")
                .columns(["Aspek", "Omega"]),
            DatasetDescriptor::new("centrality", "tables/25_Network_Centrality.csv")
                .columns(["node", "measure", "value"]),
            DatasetDescriptor::new("percentile_norms", "tables/40_Norma_Persentil.csv")
                .columns(["Aspek", "P50"]),
            DatasetDescriptor::new("t_scores", "tables/41_Norma_TSkor.csv")
                .columns(["Aspek", "Mean", "SD"]),
        ];

        let view = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        let views = BTreeMap::from([
            (
                "website".to_string(),
                view(&["demographics_gender", "demographics_education", "reliability", "descriptive"]),
            ),
            (
                "report".to_string(),
                view(&[
                    "summary",
                    "reliability",
                    "descriptive",
                    "centrality",
                    "demographics_gender",
                    "demographics_education",
                    "age_stats",
                ]),
            ),
            ("norms".to_string(), view(&["percentile_norms", "t_scores"])),
        ]);

        Self { datasets, views }
    }
}
