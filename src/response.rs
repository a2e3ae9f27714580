//! # Response Model
//!
//! The abstract response value produced by the dispatch pipeline. Mirrors the
//! shape `write_handler_response`/`write_json_error` in a transport adapter
//! would need to serialize onto the wire.

use serde_json::Value;
use std::collections::HashMap;

/// Response body payload. `Json` and `Text` carry enough information for a
/// transport adapter to set `Content-Type` itself; `Empty` never writes a body.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Text(String),
    Json(Value),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, body: Body) -> Self {
        Response {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    pub fn empty(status: u16) -> Self {
        Response::new(status, Body::Empty)
    }

    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Response::new(status, Body::Text(text.into()))
    }

    pub fn json(status: u16, value: Value) -> Self {
        Response::new(status, Body::Json(value))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn content_type(&self) -> &'static str {
        match &self.body {
            Body::Empty => "",
            Body::Text(_) => "text/plain; charset=utf-8",
            Body::Json(_) => "application/json",
            Body::Bytes(_) => "application/octet-stream",
        }
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "OK",
    }
}
