//! # Dispatcher
//!
//! The dispatcher is the single entry point a transport adapter calls: given
//! a [`crate::request::Request`], it resolves a route, builds the composed
//! middleware chain around that route's handler, and returns a
//! [`crate::response::Response`]. It never panics out past `dispatch`:
//! handler panics are caught by the handler factory and every other failure
//! is converted to a response before returning.
//!
//! Route and global-middleware tables live behind `arc-swap::ArcSwap`s, so
//! the hot path never takes a lock even while routes are registered
//! dynamically.

mod core;

pub use core::Dispatcher;
