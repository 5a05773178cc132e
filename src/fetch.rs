//! Remote document retrieval.

use std::time::Duration;

use crate::error::{FilterError, Result};

/// Source of remote YAML documents, keyed by URL
pub trait DocumentSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP client for raw rosdistro files
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FilterError::collaborator(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FilterError::collaborator(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FilterError::collaborator(format!("GET {} returned {}", url, status)));
        }

        response.text().map_err(|e| {
            FilterError::collaborator(format!("Failed to read body of {}: {}", url, e))
        })
    }
}
