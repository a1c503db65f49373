use super::{RetrievalError, Source};
use async_trait::async_trait;
use encoding_rs::Encoding;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Fetches tables relative to a base URL, the way the published dashboard does.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
    charset: &'static Encoding,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self, RetrievalError> {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(client: Client, base: &str) -> Result<Self, RetrievalError> {
        // without a trailing slash `join` would replace the last path segment
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base =
            Url::parse(&normalized).map_err(|_| RetrievalError::InvalidLocator(base.to_string()))?;
        Ok(Self {
            client,
            base,
            charset: encoding_rs::UTF_8,
        })
    }

    /// Charset assumed when the response carries none.
    pub fn with_charset(mut self, charset: &'static Encoding) -> Self {
        self.charset = charset;
        self
    }

    pub fn url_for(&self, locator: &str) -> Result<Url, RetrievalError> {
        self.base
            .join(locator)
            .map_err(|_| RetrievalError::InvalidLocator(locator.to_string()))
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn fetch(&self, locator: &str) -> Result<String, RetrievalError> {
        let url = self.url_for(locator)?;
        debug!(%url, "requesting table");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                locator: locator.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text_with_charset(self.charset.name()).await?)
    }
}
