use hyper::{Body, HeaderMap, Method, Response, StatusCode, Uri};
use std::time::{Duration, SystemTime};

pub mod storage;

pub use storage::{CacheMetrics, CacheStats, ResponseCache};

// Re-export config type for convenience
pub use crate::config::CacheConfig;

/// Cached response entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Vec<u8>,
    /// Cache creation timestamp
    pub created_at: SystemTime,
    /// Time to live
    pub ttl: Duration,
    /// Size in bytes
    pub size: usize,
}

impl CacheEntry {
    /// Create a new cache entry
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>, ttl: Duration) -> Self {
        let size = body.len();
        Self {
            status,
            headers,
            body,
            created_at: SystemTime::now(),
            ttl,
            size,
        }
    }

    /// Check if this cache entry is expired
    pub fn is_expired(&self) -> bool {
        match self.created_at.elapsed() {
            Ok(elapsed) => elapsed > self.ttl,
            Err(_) => true, // If we can't determine elapsed time, consider it expired
        }
    }

    /// Convert to HTTP response
    pub fn to_response(&self) -> Result<Response<Body>, hyper::http::Error> {
        let mut response = Response::builder().status(self.status);

        for (name, value) in &self.headers {
            response = response.header(name, value);
        }

        response = response.header("X-Cache", "HIT");

        response.body(Body::from(self.body.clone()))
    }
}

/// Cache key: request identity is method plus full URI (path and query).
///
/// Distinct query strings are distinct entries.
pub fn cache_key(method: &Method, uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{} {}", method, path_and_query)
}

/// Only responses whose final status is exactly 200 are stored.
pub fn is_cacheable_status(status: StatusCode) -> bool {
    status == StatusCode::OK
}
