//! # Request Context
//!
//! The per-request scratchpad: a type-keyed map attached to a request for the
//! lifetime of a single dispatch. The [`Router`](crate::router::Router) writes
//! extracted path parameters into it; middleware write arbitrary typed locals
//! into it (either directly, or via the `next(ctx)` sugar in
//! [`crate::middleware`]); the [`HandlerFactory`](crate::handler::HandlerFactory)
//! reads both back out when it builds the handler context.
//!
//! Backed by [`http::Extensions`], which is already part of the `http` crate
//! dependency and purpose-built as an erased, type-keyed any-map — there is no
//! need for a bespoke container here.

use http::Extensions;
use std::collections::HashMap;

/// Owned, single-request scratchpad.
///
/// Created at dispatch start and discarded when the pipeline returns; never
/// shared across requests, so no synchronization is required.
#[derive(Default)]
pub struct Scratchpad {
    locals: Extensions,
    params: HashMap<String, String>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Scratchpad::default()
    }

    /// Insert (or replace) a typed local, as a middleware does via `next(ctx)`.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.locals.insert(value)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.locals.get::<T>()
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.locals.get_mut::<T>()
    }

    pub fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}
