//! # Router Module
//!
//! Holds the flattened, dispatch-ready route table and resolves a
//! `(method, path)` pair against it. Route matching itself lives in
//! [`crate::path`]; this module owns the table, its priority ordering, and
//! the distinction between "no route matches this path" (404) and "a route
//! matches the path but not the method" (405).
//!
//! The table is held behind an `arc-swap::ArcSwap` so reads never block on a
//! writer — routes can be registered dynamically after construction without
//! taking a lock on the hot path.

mod core;

pub use core::{MatchOutcomeOwned, Router, RouterConfig};
