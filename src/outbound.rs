//! Outbound HTTP client.
//!
//! One pooled hyper client shared by the media proxy and every handler
//! invocation. Built once at startup and carried on the gateway context
//! rather than living in process-global state.

use hyper::client::HttpConnector;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Body, Client, Method, Request, Response, Uri};
use std::time::Duration;

use crate::config::HttpClientConfig;
use crate::error::GatewayResult;

/// Pooled HTTP/HTTPS client handed to handlers and the media proxy
#[derive(Clone)]
pub struct OutboundClient {
    client: Client<hyper_rustls::HttpsConnector<HttpConnector>, Body>,
}

impl OutboundClient {
    /// Build the client with optional pool tuning.
    pub fn new(config: Option<&HttpClientConfig>) -> Self {
        // Base TCP connector
        let mut http = HttpConnector::new();
        http.enforce_http(false); // allow absolute-form URIs
        http.set_nodelay(true);

        // Wrap with rustls HTTPS support and allow both https and http
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let pool_idle_timeout_secs = config.and_then(|c| c.pool_idle_timeout_secs).unwrap_or(90);
        let pool_max_idle_per_host = config.and_then(|c| c.pool_max_idle_per_host).unwrap_or(32);

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(pool_idle_timeout_secs))
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build::<_, Body>(https);

        Self { client }
    }

    /// Issue a prepared request.
    pub async fn request(&self, req: Request<Body>) -> GatewayResult<Response<Body>> {
        Ok(self.client.request(req).await?)
    }

    /// Issue a GET with fixed extra headers.
    pub async fn get_with_headers(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> GatewayResult<Response<Body>> {
        let uri: Uri = uri.parse()?;
        let mut req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())?;

        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<HeaderName>(),
                value.parse::<HeaderValue>(),
            ) {
                req.headers_mut().insert(name, value);
            }
        }

        self.request(req).await
    }
}

impl Default for OutboundClient {
    fn default() -> Self {
        Self::new(None)
    }
}
