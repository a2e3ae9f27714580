//! Middleware trait, the `next(ctx)` continuation, and chain composition.
//!
//! This replaces the simpler before/after hook pattern with the fold-right
//! `next(ctx)` composition: a middleware can run code before
//! calling `next`, short-circuit by never calling it, inspect or rewrite the
//! response `next` returns, and inject a typed value into the scratchpad for
//! every downstream stage by calling `next.with(req, value)` instead of plain
//! `next.call(req)`.

use crate::error::HttpError;
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;

/// The remainder of the pipeline, as seen by one middleware.
///
/// Calling `next` hands control to the next middleware (or, for the
/// innermost stage, the terminal handler). `with` is the `next(ctx)` sugar:
/// it merges `ctx` into the request scratchpad before recursing, making it
/// visible to every later middleware and the handler.
pub struct Next<'a> {
    inner: Box<dyn FnOnce(&mut Request) -> Result<Response, HttpError> + Send + 'a>,
}

impl<'a> Next<'a> {
    pub fn new(f: impl FnOnce(&mut Request) -> Result<Response, HttpError> + Send + 'a) -> Self {
        Next { inner: Box::new(f) }
    }

    pub fn call(self, req: &mut Request) -> Result<Response, HttpError> {
        (self.inner)(req)
    }

    pub fn with<T: Send + Sync + 'static>(self, req: &mut Request, ctx: T) -> Result<Response, HttpError> {
        req.scratchpad.insert(ctx);
        self.call(req)
    }
}

/// A single stage in the middleware chain.
///
/// Implementations run in chain order on the way in and in reverse order on
/// the way out: code before `next.call(..)` runs downstream-first, code after
/// it runs only once everything `next` invoked has returned.
pub trait Middleware: Send + Sync {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, HttpError>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, Next<'_>) -> Result<Response, HttpError> + Send + Sync,
{
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, HttpError> {
        self(req, next)
    }
}

pub type BoxedMiddleware = Arc<dyn Middleware>;
pub type Terminal = Arc<dyn Fn(&mut Request) -> Result<Response, HttpError> + Send + Sync>;

/// Fold a middleware chain (outermost first) around a terminal handler into a
/// single `request -> response` function.
///
/// The outermost middleware's `next` resolves to the second middleware, and
/// so on; the innermost middleware's `next` resolves to `terminal`.
pub fn compose(chain: &[BoxedMiddleware], terminal: Terminal) -> Terminal {
    chain.iter().rev().fold(terminal, |downstream, mw| {
        let mw = Arc::clone(mw);
        let downstream = Arc::clone(&downstream);
        Arc::new(move |req: &mut Request| {
            let downstream = Arc::clone(&downstream);
            let next = Next::new(move |req| downstream(req));
            mw.handle(req, next)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn terminal() -> Terminal {
        Arc::new(|_req: &mut Request| Ok(Response::text(200, "handler")))
    }

    struct Recorder {
        label: &'static str,
        log: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, HttpError> {
            self.log.lock().unwrap().push(format!("{}:before", self.label));
            let res = next.call(req)?;
            self.log.lock().unwrap().push(format!("{}:after", self.label));
            Ok(res)
        }
    }

    #[test]
    fn downstream_and_upstream_order_are_mirrored() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain: Vec<BoxedMiddleware> = vec![
            Arc::new(Recorder { label: "outer", log: log.clone() }),
            Arc::new(Recorder { label: "inner", log: log.clone() }),
        ];
        let pipeline = compose(&chain, terminal());
        let mut req = Request::new(Method::GET, "/");
        pipeline(&mut req).unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec!["outer:before", "inner:before", "inner:after", "outer:after"]);
    }

    #[test]
    fn short_circuit_skips_downstream_and_handler() {
        struct Blocker;
        impl Middleware for Blocker {
            fn handle(&self, _req: &mut Request, _next: Next<'_>) -> Result<Response, HttpError> {
                Ok(Response::empty(401))
            }
        }
        let chain: Vec<BoxedMiddleware> = vec![Arc::new(Blocker), Arc::new(Recorder {
            label: "never",
            log: Arc::new(std::sync::Mutex::new(Vec::new())),
        })];
        let pipeline = compose(&chain, terminal());
        let mut req = Request::new(Method::GET, "/");
        let res = pipeline(&mut req).unwrap();
        assert_eq!(res.status, 401);
    }

    #[test]
    fn next_with_injects_typed_local_downstream() {
        struct Auth;
        impl Middleware for Auth {
            fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, HttpError> {
                next.with(req, "user-1".to_string())
            }
        }
        let terminal: Terminal = Arc::new(|req: &mut Request| {
            let user = req.scratchpad.get::<String>().cloned().unwrap_or_default();
            Ok(Response::text(200, user))
        });
        let chain: Vec<BoxedMiddleware> = vec![Arc::new(Auth)];
        let pipeline = compose(&chain, terminal);
        let mut req = Request::new(Method::GET, "/");
        let res = pipeline(&mut req).unwrap();
        match res.body {
            crate::response::Body::Text(s) => assert_eq!(s, "user-1"),
            _ => panic!("expected text body"),
        }
    }
}
