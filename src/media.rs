//! Binary media passthrough proxy.
//!
//! A fixed route outside the handler registry. One outbound plain-HTTP GET
//! per inbound request; the whole remote body is buffered before the reply
//! is written. No retry, no caching.

use hyper::{Body, Response, StatusCode};
use serde_json::json;
use tracing::{info, warn};

use crate::config::MediaConfig;
use crate::dispatch::apply_cors_headers;
use crate::outbound::OutboundClient;

/// Fixed path of the media passthrough endpoint
pub const MEDIA_ROUTE: &str = "/getMusic";

/// Streams a remote binary resource through to the caller
#[derive(Clone)]
pub struct MediaProxy {
    config: MediaConfig,
}

impl MediaProxy {
    /// Create the proxy for a remote media source
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Handle a `GET /getMusic?id=<id>` request.
    pub async fn handle(
        &self,
        query_string: Option<&str>,
        origin: Option<&str>,
        client: &OutboundClient,
    ) -> Response<Body> {
        let id = query_string.and_then(extract_id);

        let id = match id {
            Some(id) => id,
            None => {
                let mut response = Response::builder()
                    .status(StatusCode::FORBIDDEN)
                    .header("Content-Type", "application/json; charset=utf-8")
                    .body(Body::from(json!({"error": "id is required"}).to_string()))
                    .expect("static error response is valid");
                apply_cors_headers(&mut response, origin);
                return response;
            }
        };

        let uri = self.config.remote_uri(&id);
        let headers = [
            ("accept-encoding", self.config.accept_encoding.as_str()),
            ("accept-language", self.config.accept_language.as_str()),
        ];

        let upstream = match client.get_with_headers(&uri, &headers).await {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!("[ERR] {}?id={}: {}", MEDIA_ROUTE, id, e);
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header("Content-Type", "application/json; charset=utf-8")
                    .body(Body::from(json!({"error": e.to_string()}).to_string()))
                    .expect("static error response is valid");
            }
        };

        let (parts, body) = upstream.into_parts();

        // Buffer the entire remote payload before replying
        let payload = match hyper::body::to_bytes(body).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("[ERR] {}?id={}: {}", MEDIA_ROUTE, id, e);
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header("Content-Type", "application/json; charset=utf-8")
                    .body(Body::from(json!({"error": e.to_string()}).to_string()))
                    .expect("static error response is valid");
            }
        };

        info!("[OK] {}?id={}", MEDIA_ROUTE, id);

        let mut response = Response::builder().status(parts.status);
        for (name, value) in parts.headers.iter() {
            if !is_hop_by_hop_header(name.as_str()) {
                response = response.header(name, value);
            }
        }

        let mut response = response
            .body(Body::from(payload))
            .unwrap_or_else(|_| Response::new(Body::empty()));
        apply_cors_headers(&mut response, origin);
        response
    }
}

/// Pull a non-empty `id` parameter out of the query string.
fn extract_id(query_string: &str) -> Option<String> {
    url::form_urlencoded::parse(query_string.as_bytes())
        .find(|(key, value)| key == "id" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Check if header is hop-by-hop
fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}
