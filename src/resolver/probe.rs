//! Lightweight content-type probe of a source

use crate::error::{Error, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Asks a source what it is without downloading it
#[async_trait]
pub trait SourceProbe: Send + Sync {
    /// Declared content type of `url`, `Ok(None)` when the response carries none
    async fn content_type(&self, url: &str) -> Result<Option<String>>;
}

/// Probe issuing a `HEAD` request
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl SourceProbe for HttpProbe {
    async fn content_type(&self, url: &str) -> Result<Option<String>> {
        let probe_failed = |reason: String| Error::ProbeFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .head(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| probe_failed(e.to_string()))?;

        debug!("Probe {url}: HTTP {}", response.status());
        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }
}
