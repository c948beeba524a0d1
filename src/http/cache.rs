//! Run-scoped memoization of service calls
//!
//! One entry per fully-qualified request URL, populated on first use and
//! never invalidated. The cache is owned by the run and handed to every
//! call site by `&mut`, so there is no locking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::client::{ResponseFormat, Transport};

/// Body and timing of one request as observed by a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response body; `None` when the transport failed
    pub body: Option<String>,
    /// Wall-clock time of the request; zero on a cache hit or transport failure
    pub elapsed: Duration,
    /// Transport error text, if the request failed
    pub error: Option<String>,
}

impl Response {
    /// An empty response standing in for a failed request
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            body: None,
            elapsed: Duration::ZERO,
            error: Some(error.into()),
        }
    }

    /// Body text, or the empty string for a failed request
    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// A stored response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub body: Option<String>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// In-memory response cache for a single run
#[derive(Debug, Default)]
pub struct CallCache {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl CallCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored entry
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Store an entry; an existing entry for `key` is kept as-is
    pub fn set(&mut self, key: impl Into<String>, response: &Response) {
        self.entries
            .entry(key.into())
            .or_insert_with(|| CacheEntry {
                body: response.body.clone(),
                elapsed: response.elapsed,
                error: response.error.clone(),
            });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Fetch `url` through the cache
    ///
    /// On a hit the stored body is returned with zero elapsed time. On a miss
    /// the transport is called once; a transport failure is stored as an
    /// empty response so later checks fail on its content, not on the error.
    pub async fn call(
        &mut self,
        transport: &dyn Transport,
        url: &str,
        format: ResponseFormat,
        timeout: Duration,
    ) -> Response {
        if let Some(entry) = self.entries.get(url) {
            self.stats.hits += 1;
            tracing::debug!(url, "call cache hit");
            return Response {
                body: entry.body.clone(),
                elapsed: Duration::ZERO,
                error: entry.error.clone(),
            };
        }

        self.stats.misses += 1;
        let start = Instant::now();
        let response = match transport.get(url, format, timeout).await {
            Ok(body) => {
                let elapsed = start.elapsed();
                tracing::info!(
                    url,
                    elapsed_ms = elapsed.as_millis() as u64,
                    bytes = body.len(),
                    "service call completed"
                );
                tracing::debug!(url, body = %body, "service response");
                Response {
                    body: Some(body),
                    elapsed,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "service call failed");
                Response::failed(e.to_string())
            }
        };

        self.set(url, &response);
        response
    }
}
