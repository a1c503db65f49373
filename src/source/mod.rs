//! Where dataset text comes from.
//!
//! A [`Source`] turns a locator (a relative path or URL fragment) into raw CSV
//! text. Every failure mode collapses into [`RetrievalError`]; the loader treats
//! them all the same way and moves to the next tier.

mod dir;
mod http;

pub use dir::DirSource;
pub use http::HttpSource;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("{locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{locator}: HTTP status {status}")]
    Status { locator: String, status: u16 },
    #[error("invalid locator '{0}'")]
    InvalidLocator(String),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

#[async_trait]
pub trait Source: Send + Sync {
    /// Fetch the full text behind `locator`.
    async fn fetch(&self, locator: &str) -> Result<String, RetrievalError>;
}

/// Pick a source for `base`: HTTP(S) URLs get an [`HttpSource`], anything else is
/// treated as a local directory.
pub fn source_for(
    base: &str,
    charset: &'static encoding_rs::Encoding,
) -> Result<Arc<dyn Source>, RetrievalError> {
    let lower = base.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(base)?.with_charset(charset)))
    } else {
        Ok(Arc::new(DirSource::new(base).with_charset(charset)))
    }
}
