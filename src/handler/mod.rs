//! Handler contract.
//!
//! A handler module is an external unit of API logic behind one shared
//! interface. The gateway owns route mapping, request normalization and
//! response translation; the handler owns everything else.

pub mod registry;

use async_trait::async_trait;
use hyper::StatusCode;
use serde_json::Value;

use crate::outbound::OutboundClient;
use crate::query::QueryMap;

pub use registry::{route_path, HandlerRegistry, RouteTable};

/// Whether a handler settled successfully or with a domain failure.
///
/// Both outcomes carry the same `Answer` shape; the discriminant exists so
/// the dispatcher has one formatting path instead of two symmetric ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure,
}

/// The uniform settlement value of a handler invocation
#[derive(Debug, Clone)]
pub struct Answer {
    /// HTTP status code declared by the handler
    pub status: StatusCode,
    /// Structured response body
    pub body: Value,
    /// Raw Set-Cookie strings to propagate to the client
    pub cookies: Vec<String>,
    /// Success/failure discriminant
    pub verdict: Verdict,
}

impl Answer {
    /// Create a successful answer
    pub fn success(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            cookies: Vec::new(),
            verdict: Verdict::Success,
        }
    }

    /// Create a failed answer
    pub fn failure(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            cookies: Vec::new(),
            verdict: Verdict::Failure,
        }
    }

    /// Attach Set-Cookie strings to this answer
    pub fn with_cookies(mut self, cookies: Vec<String>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Whether the handler settled successfully
    pub fn is_success(&self) -> bool {
        self.verdict == Verdict::Success
    }
}

/// The fixed contract every handler module implements.
///
/// `name()` is the handler's identifier in `snake_case`; the registry
/// derives the route path from it (see [`route_path`]).
#[async_trait]
pub trait ApiHandler: Send + Sync {
    /// Handler identifier, e.g. `song_url`
    fn name(&self) -> &str;

    /// Run the handler against a normalized query object
    async fn handle(&self, query: QueryMap, client: &OutboundClient) -> Answer;
}
