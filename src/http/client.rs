//! Transport to the trip-planning service
//!
//! The engine only ever issues GET requests. The [`Transport`] trait is the
//! seam tests use to substitute an in-memory service.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::fmt;
use std::time::Duration;

use crate::common::{Error, Result};

/// Body format requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// Value for the `Accept` header
    pub fn accept_header(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
            ResponseFormat::Xml => "application/xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Json => write!(f, "json"),
            ResponseFormat::Xml => write!(f, "xml"),
        }
    }
}

/// Something that can fetch a URL and return its body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, asking for `format`, giving up after `timeout`
    async fn get(&self, url: &str, format: ResponseFormat, timeout: Duration) -> Result<String>;
}

/// reqwest-backed transport used by the CLI
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, format: ResponseFormat, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, format.accept_header())
            .header(USER_AGENT, concat!("ott/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::transport(
                url,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        response.text().await.map_err(|e| classify(url, timeout, e))
    }
}

fn classify(url: &str, timeout: Duration, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        Error::transport(url, e)
    }
}
