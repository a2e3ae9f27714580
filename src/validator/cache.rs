//! # Schema Validator Cache
//!
//! Compiles JSON Schemas once and shares the compiled form across every
//! subsequent request, eliminating per-request compilation overhead.
//! Built against the current `jsonschema` 0.45 API
//! (`jsonschema::options()` / `Validator`, not the retired `JSONSchema::compile`)
//! and backed by a concurrent map instead of a single global lock.

use crate::error::HttpError;
use crate::validator::formats;
use dashmap::DashMap;
use jsonschema::Validator;
use serde_json::Value;
use std::sync::Arc;

/// Thread-safe cache of compiled validators, keyed by an opaque cache key
/// (conventionally `"{handler_name}:{field}"`, e.g. `"list_pets:query"`).
pub struct ValidatorCache {
    cache: DashMap<String, Arc<Validator>>,
    enabled: bool,
}

impl ValidatorCache {
    pub fn new(enabled: bool) -> Self {
        ValidatorCache {
            cache: DashMap::new(),
            enabled,
        }
    }

    pub fn cache_key(handler_name: &str, field: &str) -> String {
        format!("{handler_name}:{field}")
    }

    /// Compile `schema` with every built-in format check registered.
    fn compile(schema: &Value) -> Result<Validator, HttpError> {
        let mut options = jsonschema::options();
        for (name, check) in formats::all() {
            options = options.with_format(name, move |s: &str| check(s));
        }
        options
            .build(schema)
            .map_err(|e| HttpError::internal(format!("invalid schema: {e}")))
    }

    /// Get a cached validator, compiling and caching it on first use. If
    /// caching is disabled, compiles fresh on every call.
    pub fn get_or_compile(&self, key: &str, schema: &Value) -> Result<Arc<Validator>, HttpError> {
        if !self.enabled {
            return Self::compile(schema).map(Arc::new);
        }

        if let Some(existing) = self.cache.get(key) {
            tracing::debug!(cache_key = key, "schema validator cache hit");
            return Ok(Arc::clone(&existing));
        }

        let compiled = Arc::new(Self::compile(schema)?);
        let entry = self.cache.entry(key.to_string()).or_insert_with(|| Arc::clone(&compiled));
        tracing::info!(cache_key = key, cache_size = self.cache.len(), "schema validator compiled and cached");
        Ok(Arc::clone(&entry))
    }

    pub fn size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
