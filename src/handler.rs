//! # Handler Factory
//!
//! Wraps a user function so that, on every call, it receives a typed
//! [`HandlerContext`] built from the request's extracted query/params/headers/
//! cookies/body, validated against the route's [`SchemaConfig`] beforehand,
//! and its return value normalized to a canonical [`Response`] afterward
//! Precompiles its schema config at construction time so compilation
//! cost never lands on the request hot path.

use crate::error::HttpError;
use crate::parser::{self, ParserConfig};
use crate::request::Request;
use crate::response::Response;
use crate::response_mapper::{self, Returned};
use crate::validator::{Extracted, SchemaConfig, SharedSchemaValidator};
use serde_json::{Map, Value};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// The typed view of a request a handler actually operates on.
pub struct HandlerContext<'a> {
    pub req: &'a Request,
    pub body: Value,
    pub query: Value,
    pub params: Value,
    pub headers: Value,
    pub cookies: Value,
}

/// A user-supplied route handler.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: HandlerContext<'_>) -> Result<Returned, HttpError>;
}

impl<F> Handler for F
where
    F: Fn(HandlerContext<'_>) -> Result<Returned, HttpError> + Send + Sync,
{
    fn call(&self, ctx: HandlerContext<'_>) -> Result<Returned, HttpError> {
        self(ctx)
    }
}

pub type BoxedHandler = Arc<dyn Handler>;

/// Wraps a [`Handler`] with schema validation and response normalization.
pub struct HandlerFactory {
    handler_name: String,
    handler: BoxedHandler,
    schema: SchemaConfig,
    validator: SharedSchemaValidator,
    parser_config: ParserConfig,
}

impl HandlerFactory {
    pub fn new(
        handler_name: impl Into<String>,
        handler: BoxedHandler,
        schema: SchemaConfig,
        validator: SharedSchemaValidator,
        parser_config: ParserConfig,
    ) -> Result<Self, HttpError> {
        let handler_name = handler_name.into();
        validator.precompile(&handler_name, &schema)?;
        Ok(HandlerFactory {
            handler_name,
            handler,
            schema,
            validator,
            parser_config,
        })
    }

    /// Extract, validate, invoke, and map a single request.
    pub fn invoke(&self, req: &Request) -> Result<Response, HttpError> {
        let params = params_to_value(req);
        let query = parser::parse_query(&req.query_string);
        let headers = headers_to_value(req);
        let cookies = cookies_to_value(req);

        let body = if req.forbids_body() {
            Value::Null
        } else {
            match parser::parse_body(req, &self.parser_config) {
                Ok(v) => v,
                Err(e) => {
                    if self.schema.body.is_some() {
                        return Err(e);
                    }
                    Value::Null
                }
            }
        };

        let extracted = Extracted {
            body,
            query,
            params,
            headers,
            cookies,
        };

        if !self.schema.is_empty() {
            self.validator.validate_all(&self.handler_name, &self.schema, &extracted)?;
        }

        let ctx = HandlerContext {
            req,
            body: extracted.body,
            query: extracted.query,
            params: extracted.params,
            headers: extracted.headers,
            cookies: extracted.cookies,
        };

        let handler = Arc::clone(&self.handler);
        let result = catch_unwind(AssertUnwindSafe(|| handler.call(ctx)));

        let returned = match result {
            Ok(inner) => inner?,
            Err(panic) => {
                let message = panic_message(&panic);
                tracing::error!(handler = %self.handler_name, message, "handler panicked");
                return Err(HttpError::internal(format!("handler '{}' panicked: {message}", self.handler_name)));
            }
        };

        Ok(response_mapper::map(returned))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn params_to_value(req: &Request) -> Value {
    let mut map = Map::new();
    for (k, v) in req.scratchpad.params() {
        map.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(map)
}

fn headers_to_value(req: &Request) -> Value {
    let mut map = Map::new();
    for (k, v) in &req.headers {
        map.insert(k.clone(), Value::String(v.clone()));
    }
    Value::Object(map)
}

fn cookies_to_value(req: &Request) -> Value {
    let cookies = parser::parse_cookies(req.header("cookie"));
    let mut map = Map::new();
    for (k, v) in cookies {
        map.insert(k, Value::String(v));
    }
    Value::Object(map)
}
