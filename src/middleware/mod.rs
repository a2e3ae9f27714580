//! # Middleware Module
//!
//! A composable middleware system built around a `next(ctx)` continuation
//! not a before/after hook pair: each middleware decides whether,
//! when, and with what extra context downstream stages run.
//!
//! ```text
//! Request → Middleware1 → Middleware2 → ... → Handler → ... → Middleware2 → Middleware1 → Response
//! ```
//!
//! Each middleware can:
//! - run code before calling `next`, after it, or both;
//! - short-circuit by never calling `next`;
//! - inject a typed value for every downstream stage via `next.with(req, value)`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use routekit::middleware::{Middleware, Next};
//! use routekit::request::Request;
//! use routekit::response::Response;
//! use routekit::error::HttpError;
//!
//! struct Logging;
//!
//! impl Middleware for Logging {
//!     fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, HttpError> {
//!         tracing::info!(path = %req.path, "request received");
//!         next.call(req)
//!     }
//! }
//! ```

mod core;

pub use core::{compose, BoxedMiddleware, Middleware, Next, Terminal};
