//! # Request Model
//!
//! The abstract request value the dispatcher and handlers operate on. This
//! crate does not own an HTTP transport; `Request` is the seam
//! a transport adapter fills in from whatever wire representation it owns.

use crate::context::Scratchpad;
use http::Method;
use std::collections::HashMap;

/// An incoming request, transport-agnostic.
///
/// `raw_body` is populated by the transport adapter before dispatch; the
/// [`crate::parser`] module is responsible for turning it into a typed value
/// according to `Content-Type`, honoring the GET/HEAD defensive rule.
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query_string: String,
    pub headers: HashMap<String, String>,
    pub raw_body: Option<Vec<u8>>,
    pub scratchpad: Scratchpad,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            query_string: String::new(),
            headers: HashMap::new(),
            raw_body: None,
            scratchpad: Scratchpad::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query_string = query.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.raw_body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// GET and HEAD must never be treated as carrying a body, regardless of
    /// a present `Content-Type` header.
    pub fn forbids_body(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}
