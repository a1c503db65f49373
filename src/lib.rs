//! CSV ingestion for static survey dashboards.
//!
//! - `parse`: line-oriented CSV text to [`Dataset`], never failing on ragged rows.
//! - `Loader`: per-dataset cascade (primary source, optional secondary, compiled-in
//!   fallback), with concurrent independent loads and sink dispatch.
//! - `present`: number coercion and interpretation bands for the sinks.
//!
//! Data shape:
//! - `Dataset { headers, rows }`, each `Row` keyed by the shared header
//!   (access with `get(column) -> Option<&str>`).

mod codec;
mod dataset;
mod fallback;
mod loader;
mod parse;
pub mod present;
mod registry;
mod sink;
pub mod source;

pub use crate::dataset::{Dataset, Row};
pub use crate::fallback::{FallbackTable, BUILTIN_VERSION};
pub use crate::loader::{
    LoadError, LoadOptions, LoadReport, Loaded, Loader, Tier, TierAttempt, TierFailure,
};
pub use crate::parse::parse;
pub use crate::registry::{ConfigError, DatasetDescriptor, Registry};
pub use crate::sink::{Sink, SinkSet};
pub use crate::source::{source_for, RetrievalError, Source};

use thiserror::Error;

/// Error type returned by this crate when not using `anyhow`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("unknown charset '{0}'")]
    UnknownCharset(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Look up a charset by its WHATWG label (`utf-8`, `windows-1252`, `latin1`, ...).
pub fn charset_for_label(label: &str) -> IngestResult<&'static encoding_rs::Encoding> {
    encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| IngestError::UnknownCharset(label.to_string()))
}

/// Build a loader for the built-in dashboard registry and fallback table over
/// whatever `base` points at (directory or HTTP base URL).
pub fn dashboard_loader(base: &str) -> IngestResult<Loader> {
    let source = source_for(base, encoding_rs::UTF_8)?;
    let loader = Loader::new(
        source,
        Registry::builtin(),
        std::sync::Arc::new(FallbackTable::builtin()),
    )?;
    Ok(loader)
}
