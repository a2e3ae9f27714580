//! # Schema Validator
//!
//! Compiles per-route schemas once (at registration, via [`SchemaValidator::precompile`])
//! and validates extracted request fields against them on every request via
//! [`SchemaValidator::validate_all`]. The validator is schema-language
//! agnostic in contract — the schema representation is deliberately left open —
//! but this crate backs it with JSON Schema via `jsonschema`, matching the
//! teacher's own choice of validator library.

mod cache;
pub mod formats;

pub use cache::ValidatorCache;

use crate::error::HttpError;
use serde_json::Value;
use std::sync::Arc;

/// Per-route schema configuration. Each field is optional; absent fields are
/// simply not validated. `response` is informational only — it drives
/// introspection/tooling, not runtime enforcement.
#[derive(Debug, Clone, Default)]
pub struct SchemaConfig {
    pub body: Option<Value>,
    pub query: Option<Value>,
    pub params: Option<Value>,
    pub headers: Option<Value>,
    pub cookies: Option<Value>,
    pub response: Option<Value>,
}

impl SchemaConfig {
    pub fn is_empty(&self) -> bool {
        self.body.is_none() && self.query.is_none() && self.params.is_none() && self.headers.is_none() && self.cookies.is_none()
    }

    fn enforced_fields(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        [
            ("body", &self.body),
            ("query", &self.query),
            ("params", &self.params),
            ("headers", &self.headers),
            ("cookies", &self.cookies),
        ]
        .into_iter()
        .filter_map(|(name, schema)| schema.as_ref().map(|s| (name, s)))
    }
}

/// The request fields a route's [`SchemaConfig`] may validate against.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub body: Value,
    pub query: Value,
    pub params: Value,
    pub headers: Value,
    pub cookies: Value,
}

impl Extracted {
    fn get(&self, field: &str) -> &Value {
        match field {
            "body" => &self.body,
            "query" => &self.query,
            "params" => &self.params,
            "headers" => &self.headers,
            "cookies" => &self.cookies,
            _ => unreachable!("enforced_fields only yields known field names"),
        }
    }
}

/// Compiles and validates [`SchemaConfig`]s against [`Extracted`] request data.
pub struct SchemaValidator {
    cache: ValidatorCache,
}

impl SchemaValidator {
    pub fn new(cache_enabled: bool) -> Self {
        SchemaValidator {
            cache: ValidatorCache::new(cache_enabled),
        }
    }

    /// Eagerly compile every schema present in `config`, under cache keys
    /// scoped to `handler_name`. Called at route registration so the
    /// compilation cost never lands on the request hot path.
    pub fn precompile(&self, handler_name: &str, config: &SchemaConfig) -> Result<(), HttpError> {
        for (field, schema) in config.enforced_fields() {
            let key = ValidatorCache::cache_key(handler_name, field);
            self.cache.get_or_compile(&key, schema)?;
        }
        Ok(())
    }

    /// Validate every present sub-schema against the matching extracted
    /// field. Stops at the first failure, reporting the offending field.
    pub fn validate_all(&self, handler_name: &str, config: &SchemaConfig, extracted: &Extracted) -> Result<(), HttpError> {
        for (field, schema) in config.enforced_fields() {
            let key = ValidatorCache::cache_key(handler_name, field);
            let validator = self.cache.get_or_compile(&key, schema)?;
            let instance = extracted.get(field);
            if let Some(first_error) = validator.iter_errors(instance).next() {
                return Err(HttpError::validation(field, first_error));
            }
        }
        Ok(())
    }

    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }
}

pub type SharedSchemaValidator = Arc<SchemaValidator>;
