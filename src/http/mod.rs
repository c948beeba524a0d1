//! Service access: the HTTP transport and the run-scoped call cache

mod cache;
mod client;

pub use cache::{CacheEntry, CacheStats, CallCache, Response};
pub use client::{HttpTransport, ResponseFormat, Transport};
