//! # Route Tree
//!
//! The nested, author-facing shape of a route table: leaves carry a handler,
//! groups carry a path prefix and middleware that their descendants inherit.
//! This tree is never matched against directly — see [`crate::flatten`], which
//! resolves it into the flat, priority-ordered table the dispatcher uses.

use crate::handler::BoxedHandler;
use crate::middleware::BoxedMiddleware;
use crate::validator::SchemaConfig;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// A single registered endpoint: method, path, handler, and everything that
/// configures how a request reaching it is validated.
pub struct Route {
    pub method: Method,
    pub path: String,
    pub handler: BoxedHandler,
    pub middleware: Vec<BoxedMiddleware>,
    pub schema: SchemaConfig,
    pub metadata: HashMap<String, Value>,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, handler: BoxedHandler) -> Self {
        Route {
            method,
            path: path.into(),
            handler,
            middleware: Vec::new(),
            schema: SchemaConfig::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn middleware(mut self, mw: BoxedMiddleware) -> Self {
        self.middleware.push(mw);
        self
    }

    pub fn schema(mut self, schema: SchemaConfig) -> Self {
        self.schema = schema;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A node in the route tree: either a terminal leaf or a group contributing a
/// path prefix and inherited middleware to its children.
pub enum RouteNode {
    Leaf(Route),
    Group(RouteGroup),
}

impl From<Route> for RouteNode {
    fn from(route: Route) -> Self {
        RouteNode::Leaf(route)
    }
}

impl From<RouteGroup> for RouteNode {
    fn from(group: RouteGroup) -> Self {
        RouteNode::Group(group)
    }
}

/// A group of routes (and nested groups) sharing a path prefix and middleware
/// chain. Carries no handler of its own.
#[derive(Default)]
pub struct RouteGroup {
    pub prefix: String,
    pub middleware: Vec<BoxedMiddleware>,
    pub children: Vec<RouteNode>,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>) -> Self {
        RouteGroup {
            prefix: prefix.into(),
            middleware: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn middleware(mut self, mw: BoxedMiddleware) -> Self {
        self.middleware.push(mw);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.children.push(RouteNode::Leaf(route));
        self
    }

    pub fn group(mut self, group: RouteGroup) -> Self {
        self.children.push(RouteNode::Group(group));
        self
    }
}

/// Convenience alias: the root of a route tree is just a group with an empty
/// (or base) prefix.
pub type RouteTree = RouteGroup;
