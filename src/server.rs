//! Gateway HTTP server.
//!
//! Owns the per-request pipeline: preflight handling, cookie translation,
//! query normalization, cache lookup, route matching, dispatch, and cache
//! population. All state a request needs lives on an immutable context
//! built once at startup and cloned into the connection service.

use anyhow::Result;
use hyper::header::{HeaderValue, COOKIE, ORIGIN};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{cache_key, is_cacheable_status, CacheEntry, ResponseCache};
use crate::config::Config;
use crate::cookies::parse_cookie_header;
use crate::dispatch::{apply_cors_headers, dispatch, not_found_response, preflight_response};
use crate::handler::{HandlerRegistry, RouteTable};
use crate::media::{MediaProxy, MEDIA_ROUTE};
use crate::outbound::OutboundClient;
use crate::query::normalize_request;

/// Immutable per-process state shared by all requests
#[derive(Clone)]
pub struct GatewayContext {
    routes: Arc<RouteTable>,
    cache: ResponseCache,
    media: MediaProxy,
    client: OutboundClient,
}

impl GatewayContext {
    /// Build the context from configuration and a populated registry.
    pub fn new(config: &Config, registry: HandlerRegistry) -> Self {
        let routes = Arc::new(registry.freeze());
        let cache = ResponseCache::new(config.cache.clone());
        let media = MediaProxy::new(config.media.clone());
        let client = OutboundClient::new(config.http_client.as_ref());

        Self {
            routes,
            cache,
            media,
            client,
        }
    }

    /// Registered route table
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Response cache handle
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

/// HTTP server for the gateway
pub struct GatewayServer {
    bind_addr: SocketAddr,
    context: GatewayContext,
}

impl GatewayServer {
    /// Create a new gateway server from configuration and registered handlers.
    pub fn new(config: Config, registry: HandlerRegistry) -> Self {
        let context = GatewayContext::new(&config, registry);
        Self {
            bind_addr: config.server.bind,
            context,
        }
    }

    /// Bind the listener and spawn the accept loop.
    ///
    /// Returns the bound address (useful with a port-0 bind) and the server
    /// task handle.
    pub fn start(self) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
        let context = self.context;

        let make_service = make_service_fn(move |_conn: &AddrStream| {
            let context = context.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let context = context.clone();
                    async move { handle_request(context, req).await }
                }))
            }
        });

        let server = Server::try_bind(&self.bind_addr)?.serve(make_service);
        let addr = server.local_addr();

        info!("Gateway listening on {}", addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = server.await {
                error!("HTTP server error: {}", e);
                return Err(e.into());
            }
            Ok(())
        });

        Ok((addr, handle))
    }

    /// Run the server until it stops.
    pub async fn run(self) -> Result<()> {
        let (_, handle) = self.start()?;
        handle.await?
    }
}

/// Entry point for every inbound request.
async fn handle_request(
    context: GatewayContext,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    // Preflight requests never reach the dispatch path
    if req.method() == Method::OPTIONS {
        return Ok(preflight_response(origin.as_deref()));
    }

    match process_request(&context, req, origin.as_deref()).await {
        Ok(response) => Ok(response),
        Err(e) => {
            warn!("Request processing error: {}", e);
            let mut response = Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json; charset=utf-8")
                .body(Body::from(r#"{"error": "internal server error"}"#))
                .expect("static error response is valid");
            apply_cors_headers(&mut response, origin.as_deref());
            Ok(response)
        }
    }
}

/// Cache-wrapped dispatch pipeline.
async fn process_request(
    context: &GatewayContext,
    req: Request<Body>,
    origin: Option<&str>,
) -> Result<Response<Body>> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();

    // Media passthrough is registry-independent and never cached
    if path == MEDIA_ROUTE {
        return Ok(context
            .media
            .handle(uri.query(), origin, &context.client)
            .await);
    }

    // Cache lookup short-circuits dispatch entirely
    let key = cache_key(&method, &uri);
    if let Some(entry) = context.cache.get(&key).await {
        debug!("Cache hit for {}", key);
        let mut response = entry.to_response()?;
        apply_cors_headers(&mut response, origin);
        return Ok(response);
    }

    let route = match context.routes.matched(&path) {
        Some(route) => route,
        None => {
            debug!("No handler for {}", path);
            let mut response = not_found_response();
            apply_cors_headers(&mut response, origin);
            return Ok(response);
        }
    };

    // Normalize request inputs into one query object
    let cookies = req
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(parse_cookie_header)
        .unwrap_or_else(HashMap::new);

    let (parts, body) = req.into_parts();
    let body_bytes = hyper::body::to_bytes(body).await.unwrap_or_default();
    let query = normalize_request(uri.query(), &parts.headers, body_bytes, cookies).await;

    let original_url = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(&path)
        .to_string();

    let mut response = dispatch(route, query, &context.client, &original_url).await;
    apply_cors_headers(&mut response, origin);

    // Only a 200 response populates the cache
    if is_cacheable_status(response.status()) {
        let (parts, body) = response.into_parts();
        let payload = hyper::body::to_bytes(body).await?;

        let entry = CacheEntry::new(
            parts.status,
            parts.headers.clone(),
            payload.to_vec(),
            context.cache.entry_ttl(),
        );
        if let Err(e) = context.cache.put(key, entry).await {
            warn!("Failed to cache response: {}", e);
        }

        let mut rebuilt = Response::from_parts(parts, Body::from(payload));
        rebuilt
            .headers_mut()
            .insert("X-Cache", HeaderValue::from_static("MISS"));
        return Ok(rebuilt);
    }

    Ok(response)
}
