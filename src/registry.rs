//! # Route Registry
//!
//! A read-only, introspectable view of the dispatcher's flattened route
//! table: the same routes it matches against, stripped of the compiled
//! pattern and wrapped handler closure. Meant to drive external
//! tooling — an API-spec exporter, a route-listing CLI — without reaching
//! into dispatch internals.

use crate::router::Router;
use crate::validator::SchemaConfig;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// One registered endpoint, as seen from outside the dispatch pipeline.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub method: Method,
    pub path: String,
    pub middleware_count: usize,
    pub schema: SchemaConfig,
    pub metadata: HashMap<String, Value>,
}

/// Snapshot of every route currently registered, in priority order.
///
/// Rebuilt from the dispatcher's router on every call to
/// [`crate::dispatcher::Dispatcher::registry`] — it reflects whatever routes
/// are registered at the moment it's taken, including ones added
/// dynamically after construction.
pub struct RouteRegistry {
    routes: Vec<RouteInfo>,
}

impl RouteRegistry {
    pub(crate) fn from_router(router: &Router) -> Self {
        let routes = router.snapshot(|route| RouteInfo {
            method: route.method.clone(),
            path: route.path.clone(),
            middleware_count: route.middleware.len(),
            schema: route.schema.clone(),
            metadata: route.metadata.clone(),
        });
        RouteRegistry { routes }
    }

    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<&RouteInfo> {
        self.routes.iter().find(|r| &r.method == method && r.path == path)
    }
}
