//! Handler registration and route mapping.
//!
//! Handlers are enumerated explicitly at startup. Each handler's route is
//! derived from its identifier (`name_with_underscores` becomes
//! `/name/with/underscores`) unless the override table maps the name to a
//! literal path. After registration the table is frozen and ordered so that
//! longer paths always match before a shorter path that is a strict prefix
//! of them.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::ApiHandler;
use crate::error::{GatewayError, GatewayResult};

/// Handler names whose route is not the underscore-to-slash transform
static ROUTE_OVERRIDES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut overrides = HashMap::new();
    overrides.insert("daily_signin", "/daily_signin");
    overrides.insert("fm_trash", "/fm_trash");
    overrides.insert("personal_fm", "/personal_fm");
    overrides
});

/// Compute the route path for a handler identifier.
pub fn route_path(name: &str) -> String {
    match ROUTE_OVERRIDES.get(name) {
        Some(path) => (*path).to_string(),
        None => format!("/{}", name.replace('_', "/")),
    }
}

/// One registered route
pub struct Route {
    pub path: String,
    pub handler: Arc<dyn ApiHandler>,
}

/// Mutable registration phase of the route table
#[derive(Default)]
pub struct HandlerRegistry {
    routes: Vec<Route>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its derived route path.
    ///
    /// A duplicate path is a fatal startup error.
    pub fn register(&mut self, handler: Arc<dyn ApiHandler>) -> GatewayResult<()> {
        let path = route_path(handler.name());

        if self.routes.iter().any(|r| r.path == path) {
            return Err(GatewayError::route(format!(
                "duplicate path {} for handler '{}'",
                path,
                handler.name()
            )));
        }

        debug!("Registered handler '{}' at {}", handler.name(), path);
        self.routes.push(Route { path, handler });
        Ok(())
    }

    /// Freeze the registry into an ordered, immutable route table.
    pub fn freeze(mut self) -> RouteTable {
        // Longest path first, so /song/url/v1 wins over /song/url for
        // requests targeting the longer route. Ties break lexicographically
        // to keep the order deterministic.
        self.routes.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.path.cmp(&b.path))
        });

        RouteTable {
            routes: self.routes,
        }
    }
}

/// Immutable, match-ordered route table shared by all requests
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Find the first route matching a request path.
    ///
    /// A route matches its exact path and any sub-path below it, mirroring
    /// mount-point semantics: `/song/url` matches `/song/url` and
    /// `/song/url/xxx` but not `/song/urls`.
    pub fn matched(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| {
            path == route.path
                || (path.starts_with(&route.path)
                    && path.as_bytes().get(route.path.len()) == Some(&b'/'))
        })
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths in match order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.path.as_str())
    }
}
