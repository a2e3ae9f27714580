//! # RouteKit
//!
//! **RouteKit** is the core of a high-performance HTTP request-dispatching
//! framework: route compilation, middleware composition, schema-validated
//! typed handlers, and request observability, independent of any particular
//! transport.
//!
//! This crate does not own a socket, an async runtime, or a wire codec
//! (those are a transport adapter's job); it owns everything between "a
//! method and a path arrived" and "here is a response body to write back."
//!
//! ## Architecture
//!
//! - [`path`] — compiles `/users/:id`-style patterns and matches them
//!   against request paths, with the specificity rules that decide which of
//!   several matching routes wins.
//! - [`route`] — the nested, author-facing route tree: groups carry a path
//!   prefix and middleware that their children inherit.
//! - [`flatten`] — resolves a route tree into the flat, priority-ordered
//!   table the dispatcher actually matches against.
//! - [`router`] — holds that flat table behind a lock-free `ArcSwap` and
//!   resolves `(method, path)` against it, distinguishing "no route matches
//!   this path" (404) from "a route matches the path but not the method"
//!   (405).
//! - [`middleware`] — a `next(ctx)`-style composer: fold a middleware chain
//!   around a terminal handler into one `request -> response` function.
//! - [`parser`] — extracts query, headers, cookies, and a typed body from a
//!   request.
//! - [`validator`] — compiles and caches JSON Schema validators per route,
//!   plus a library of built-in string format checks.
//! - [`handler`] — wraps a user function with schema validation, panic
//!   recovery, and response normalization.
//! - [`response_mapper`] — normalizes whatever a handler returns into a
//!   canonical [`response::Response`].
//! - [`dispatcher`] — ties all of the above into the single entry point a
//!   transport adapter calls.
//! - [`monitor`] — a non-intrusive wrapper recording per-request metrics and
//!   exposing percentile latencies on demand.
//! - [`registry`] — a read-only introspection view of the registered route
//!   table, for external tooling.
//! - [`error`] — the error type threaded through the whole pipeline.
//!
//! ## Example
//!
//! ```rust,ignore
//! use routekit::dispatcher::Dispatcher;
//! use routekit::handler::{HandlerContext, BoxedHandler};
//! use routekit::response_mapper::Returned;
//! use routekit::route::{Route, RouteGroup};
//! use routekit::request::Request;
//! use http::Method;
//! use std::sync::Arc;
//!
//! let get_user: BoxedHandler = Arc::new(|ctx: HandlerContext<'_>| {
//!     Ok(Returned::from(serde_json::json!({ "id": ctx.params["id"] })))
//! });
//!
//! let tree = RouteGroup::new("/api").route(Route::new(Method::GET, "/users/:id", get_user));
//! let dispatcher = Dispatcher::new(tree).unwrap();
//!
//! let mut req = Request::new(Method::GET, "/api/users/42");
//! let response = dispatcher.dispatch(&mut req);
//! assert_eq!(response.status, 200);
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod flatten;
pub mod handler;
pub mod ids;
pub mod middleware;
pub mod monitor;
pub mod parser;
pub mod path;
pub mod registry;
pub mod request;
pub mod response;
pub mod response_mapper;
pub mod route;
pub mod router;
pub mod validator;
