//! # Response Mapper
//!
//! Normalizes whatever a handler returns into a canonical [`Response`], per
//! a fixed rules table. Handlers return a [`Returned`] value — a small
//! closed enum standing in for "arbitrary return shape" in a statically
//! typed language — with `From` conversions from the common Rust types so a
//! handler can simply `return "hello".into()` or `return json!({...}).into()`.

use crate::response::{Body, Response};
use serde_json::Value;

/// Whatever a handler produced, before being mapped to a [`Response`].
#[derive(Debug, Clone)]
pub enum Returned {
    /// An already-built response, returned unchanged.
    Response(Response),
    /// `null` — maps to 204 with no body.
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    /// `{data, status?, headers?}` — a wrapped value with response-level
    /// overrides. `status` and `headers` are optional, but at least one of
    /// them must be present for this shape to apply (see `From<Value>`).
    Wrapped {
        data: Box<Returned>,
        status: Option<u16>,
        headers: Vec<(String, String)>,
    },
    /// Any other JSON object or array.
    Json(Value),
}

impl From<Response> for Returned {
    fn from(r: Response) -> Self {
        Returned::Response(r)
    }
}

impl From<()> for Returned {
    fn from(_: ()) -> Self {
        Returned::Null
    }
}

impl From<String> for Returned {
    fn from(s: String) -> Self {
        Returned::Text(s)
    }
}

impl From<&str> for Returned {
    fn from(s: &str) -> Self {
        Returned::Text(s.to_string())
    }
}

impl From<f64> for Returned {
    fn from(n: f64) -> Self {
        Returned::Number(n)
    }
}

impl From<bool> for Returned {
    fn from(b: bool) -> Self {
        Returned::Bool(b)
    }
}

/// Converts a raw JSON value, classifying `{data, status?, headers?}`
/// objects into [`Returned::Wrapped`] and everything else per the table.
impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Returned::Null,
            Value::String(s) => Returned::Text(s),
            Value::Number(n) => Returned::Number(n.as_f64().unwrap_or(0.0)),
            Value::Bool(b) => Returned::Bool(b),
            Value::Object(ref map) if map.contains_key("data") && (map.contains_key("status") || map.contains_key("headers")) => {
                let mut map = map.clone();
                let data = map.remove("data").unwrap_or(Value::Null);
                let status = map.remove("status").and_then(|s| s.as_u64()).map(|s| s as u16);
                let headers = match map.remove("headers") {
                    Some(Value::Object(h)) => h
                        .into_iter()
                        .map(|(k, v)| (k, v.as_str().unwrap_or_default().to_string()))
                        .collect(),
                    _ => Vec::new(),
                };
                Returned::Wrapped {
                    data: Box::new(Returned::from(data)),
                    status,
                    headers,
                }
            }
            other => Returned::Json(other),
        }
    }
}

/// Map a [`Returned`] value into the canonical [`Response`] the dispatcher
/// sends to the client.
pub fn map(value: Returned) -> Response {
    match value {
        Returned::Response(r) => r,
        Returned::Null => Response::empty(204),
        Returned::Text(s) => Response::text(200, s),
        Returned::Number(n) => Response::text(200, n.to_string()),
        Returned::Bool(b) => Response::text(200, b.to_string()),
        Returned::Json(v) => Response::json(200, v),
        Returned::Wrapped { data, status, headers } => {
            let mut response = map(*data);
            let status = status.unwrap_or(response.status);
            // 200 status with an empty body collapses to 204.
            response.status = if status == 200 && matches!(response.body, Body::Empty) {
                204
            } else {
                status
            };
            for (k, v) in headers {
                response = response.header(k, v);
            }
            response
        }
    }
}
