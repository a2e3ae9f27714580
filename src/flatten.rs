//! # Route Flattener
//!
//! Resolves a nested [`RouteTree`] into a flat list of [`FlattenedRoute`]s
//! ready for dispatch. A depth-first traversal accumulates the prefix
//! and inherited middleware chain as it descends; every leaf in the input
//! tree produces exactly one flattened route, and groups produce none
//! invariant 1).

use crate::error::HttpError;
use crate::handler::BoxedHandler;
use crate::middleware::BoxedMiddleware;
use crate::path::Pattern;
use crate::route::{RouteGroup, RouteNode, RouteTree};
use crate::router::RouterConfig;
use crate::validator::SchemaConfig;
use http::Method;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A single leaf, resolved to its full path and composed middleware chain.
pub struct FlattenedRoute {
    pub method: Method,
    pub path: String,
    pub pattern: Pattern,
    pub middleware: Vec<BoxedMiddleware>,
    pub handler: BoxedHandler,
    pub schema: SchemaConfig,
    pub metadata: HashMap<String, Value>,
}

/// Flatten a route tree into its dispatch-ready leaves. Duplicate
/// `(method, path)` registrations are always logged via `tracing::warn!`;
/// whether they also fail registration is governed by `config`.
pub fn flatten(tree: RouteTree, config: &RouterConfig) -> Result<Vec<FlattenedRoute>, HttpError> {
    let mut out = Vec::new();
    walk(tree, String::new(), Vec::new(), &mut out)?;
    check_duplicates(&out, config)?;
    Ok(out)
}

fn walk(
    group: RouteGroup,
    prefix: String,
    mut middleware: Vec<BoxedMiddleware>,
    out: &mut Vec<FlattenedRoute>,
) -> Result<(), HttpError> {
    let prefix = join(&prefix, &group.prefix);
    middleware.extend(group.middleware);

    for child in group.children {
        match child {
            RouteNode::Leaf(route) => {
                let full_path = join(&prefix, &route.path);
                let mut chain = middleware.clone();
                chain.extend(route.middleware);
                out.push(FlattenedRoute {
                    pattern: Pattern::parse(&full_path)?,
                    method: route.method,
                    path: full_path,
                    middleware: chain,
                    handler: route.handler,
                    schema: route.schema,
                    metadata: route.metadata,
                });
            }
            RouteNode::Group(nested) => {
                walk(nested, prefix.clone(), middleware.clone(), out)?;
            }
        }
    }
    Ok(())
}

fn join(prefix: &str, segment: &str) -> String {
    crate::path::normalize(&format!("{prefix}/{segment}"))
}

/// Always logs duplicates; in debug builds, also fails registration when
/// `config.fail_on_duplicate_routes` is set.
fn check_duplicates(routes: &[FlattenedRoute], config: &RouterConfig) -> Result<(), HttpError> {
    let mut seen = HashSet::new();
    for route in routes {
        let key = (route.method.clone(), route.path.clone());
        if !seen.insert(key) {
            tracing::warn!(method = %route.method, path = %route.path, "duplicate route registered");
            if cfg!(debug_assertions) && config.fail_on_duplicate_routes {
                return Err(HttpError::internal(format!(
                    "duplicate route registered: {} {}",
                    route.method, route.path
                )));
            }
        }
    }
    Ok(())
}
