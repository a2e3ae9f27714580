//! The dispatcher ties the router, middleware composer, and handler factory
//! together into a single `request -> response` entry point.

use crate::error::{ErrorKind, HttpError};
use crate::flatten::{flatten, FlattenedRoute};
use crate::handler::HandlerFactory;
use crate::ids::RequestId;
use crate::middleware::{compose, BoxedMiddleware, Terminal};
use crate::monitor::Monitor;
use crate::parser::ParserConfig;
use crate::request::Request;
use crate::response::Response;
use crate::route::RouteTree;
use crate::router::{MatchOutcomeOwned, Router, RouterConfig};
use crate::validator::{SchemaValidator, SharedSchemaValidator};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use http::Method;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Composes a [`Router`], global middleware, and per-route handler factories
/// into the single callable a transport adapter drives.
///
/// Route tables and global middleware are held behind `ArcSwap`s so the hot
/// path (matching and composing a chain) never blocks on a writer, even while
/// routes are being registered dynamically.
pub struct Dispatcher {
    router: Router,
    router_config: RouterConfig,
    global_middleware: ArcSwap<Vec<BoxedMiddleware>>,
    validator: SharedSchemaValidator,
    parser_config: ParserConfig,
    /// One precompiled [`HandlerFactory`] per registered route, keyed by
    /// [`route_name`]. Built once at registration time so the request hot
    /// path never re-runs schema precompilation.
    factories: DashMap<String, Arc<HandlerFactory>>,
    monitor: Option<Arc<Monitor>>,
}

impl Dispatcher {
    pub fn new(tree: RouteTree) -> Result<Self, HttpError> {
        Self::with_cache(tree, true)
    }

    /// Construct with the validator cache explicitly enabled or disabled —
    /// tests that want to observe raw compile cost disable it.
    pub fn with_cache(tree: RouteTree, cache_enabled: bool) -> Result<Self, HttpError> {
        let router_config = RouterConfig::default();
        let validator = Arc::new(SchemaValidator::new(cache_enabled));
        let parser_config = ParserConfig::default();
        let routes = flatten(tree, &router_config)?;
        let factories = DashMap::new();
        for route in &routes {
            factories.insert(route_name(route), Arc::new(build_factory(route, &validator, &parser_config)?));
        }
        Ok(Dispatcher {
            router: Router::new(routes),
            router_config,
            global_middleware: ArcSwap::from_pointee(Vec::new()),
            validator,
            parser_config,
            factories,
            monitor: None,
        })
    }

    pub fn with_monitor(mut self, monitor: Arc<Monitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Set the parser config and rebuild every already-registered route's
    /// handler factory against it. Intended to be called before traffic is
    /// dispatched, alongside `with_monitor`.
    pub fn with_parser_config(mut self, parser_config: ParserConfig) -> Result<Self, HttpError> {
        self.parser_config = parser_config;
        self.rebuild_factories()?;
        Ok(self)
    }

    /// Set the router config governing duplicate-route registration. Only
    /// affects routes registered after this call.
    pub fn with_router_config(mut self, router_config: RouterConfig) -> Self {
        self.router_config = router_config;
        self
    }

    /// Rebuild every cached [`HandlerFactory`] against the current validator
    /// and parser config, e.g. after `with_parser_config` changes the config
    /// for routes registered before the change.
    fn rebuild_factories(&self) -> Result<(), HttpError> {
        let entries = self
            .router
            .snapshot(|route| (route_name(route), Arc::clone(&route.handler), route.schema.clone()));
        for (name, handler, schema) in entries {
            let factory = HandlerFactory::new(name.clone(), handler, schema, Arc::clone(&self.validator), self.parser_config.clone())?;
            self.factories.insert(name, Arc::new(factory));
        }
        Ok(())
    }

    pub fn monitor(&self) -> Option<&Arc<Monitor>> {
        self.monitor.as_ref()
    }

    pub fn route_count(&self) -> usize {
        self.router.route_count()
    }

    /// A read-only snapshot of every registered route, for introspection or
    /// external tool generation.
    pub fn registry(&self) -> crate::registry::RouteRegistry {
        crate::registry::RouteRegistry::from_router(&self.router)
    }

    /// Register a middleware that runs on every request, ahead of any
    /// route-specific middleware.
    pub fn add_global_middleware(&self, mw: BoxedMiddleware) {
        let mut current: Vec<BoxedMiddleware> = (**self.global_middleware.load()).clone();
        current.push(mw);
        self.global_middleware.store(Arc::new(current));
    }

    /// Register additional routes after construction, re-sorting the table
    /// by specificity.
    pub fn add_routes(&self, tree: RouteTree) -> Result<(), HttpError> {
        let routes = flatten(tree, &self.router_config)?;
        for route in &routes {
            self.factories.insert(
                route_name(route),
                Arc::new(build_factory(route, &self.validator, &self.parser_config)?),
            );
        }
        self.router.append(routes);
        Ok(())
    }

    /// Dispatch one request to completion. Never panics out past this call:
    /// handler panics are caught by the handler factory, and every other
    /// failure is converted to a response before returning.
    pub fn dispatch(&self, req: &mut Request) -> Response {
        let request_id = RequestId::from_header_or_new(req.header("x-request-id"));
        req.scratchpad.insert(request_id);

        let method = req.method.clone();
        let path = req.path.clone();
        let started = Instant::now();

        let response = self.dispatch_inner(req, &method, &path);

        if let Some(monitor) = &self.monitor {
            if monitor.should_record(&path) {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                monitor.record(method.as_str(), &path, response.status, elapsed_ms, request_id);
            }
        }

        response
    }

    fn dispatch_inner(&self, req: &mut Request, method: &Method, path: &str) -> Response {
        if method == Method::OPTIONS {
            return self.handle_preflight(path);
        }

        let global: Vec<BoxedMiddleware> = (**self.global_middleware.load()).clone();

        match self.router.match_request(method, path) {
            MatchOutcomeOwned::Matched { index, params } => {
                req.scratchpad.set_params(params.into_iter().map(|(k, v)| (k.to_string(), v)).collect());
                let pipeline = self.router.with_route(index, |route| self.build_pipeline(&global, route));
                match pipeline {
                    Some(pipeline) => run(&pipeline, req),
                    None => not_found_response(),
                }
            }
            MatchOutcomeOwned::MethodMismatch(allowed) => {
                let method = method.clone();
                let terminal: Terminal = Arc::new(move |_req| Err(HttpError::method_not_allowed(&method_names(&allowed))));
                run(&compose(&global, terminal), req)
            }
            MatchOutcomeOwned::NotFound => {
                let terminal: Terminal = Arc::new(|_req| Err(HttpError::not_found()));
                run(&compose(&global, terminal), req)
            }
        }
    }

    fn build_pipeline(&self, global: &[BoxedMiddleware], route: &FlattenedRoute) -> Terminal {
        let mut chain = global.to_vec();
        chain.extend(route.middleware.iter().cloned());

        let handler_name = route_name(route);
        let factory = self
            .factories
            .get(&handler_name)
            .map(|entry| Arc::clone(entry.value()));

        let terminal: Terminal = Arc::new(move |req: &mut Request| match &factory {
            Some(factory) => factory.invoke(req),
            None => Err(HttpError::internal(format!(
                "no handler factory registered for '{handler_name}'"
            ))),
        });

        compose(&chain, terminal)
    }

    /// Answer an `OPTIONS` pre-flight: 204 with the allowed method set for a
    /// registered path, or 204 with no `Allow` header when the path matches
    /// no route at all (the pre-flight itself is never a 404).
    fn handle_preflight(&self, path: &str) -> Response {
        let allowed = self.router.allowed_methods(path);
        if allowed.is_empty() {
            return Response::empty(204);
        }
        let methods = method_names(&allowed);
        Response::empty(204).header("Allow", methods.join(", "))
    }
}

/// Build a [`HandlerFactory`] for `route`, precompiling its schema against
/// `validator` at registration time rather than on the request hot path.
fn build_factory(route: &FlattenedRoute, validator: &SharedSchemaValidator, parser_config: &ParserConfig) -> Result<HandlerFactory, HttpError> {
    HandlerFactory::new(
        route_name(route),
        Arc::clone(&route.handler),
        route.schema.clone(),
        Arc::clone(validator),
        parser_config.clone(),
    )
}

fn run(pipeline: &Terminal, req: &mut Request) -> Response {
    match pipeline(req) {
        Ok(res) => res,
        Err(err) => error_response(err, req.method.as_str()),
    }
}

/// A stable identity for a route's compiled schemas and log lines. Not a
/// user-facing name — just `METHOD path`.
fn route_name(route: &FlattenedRoute) -> String {
    format!("{} {}", route.method, route.path)
}

fn method_names(methods: &[Method]) -> Vec<String> {
    methods.iter().map(|m| m.to_string()).collect()
}

fn not_found_response() -> Response {
    Response::json(404, json!({"success": false, "error": "Not Found"}))
}

/// Map an [`HttpError`] escaping the pipeline to its wire response, per the
/// bit-exact wire shapes.
fn error_response(err: HttpError, method: &str) -> Response {
    match err.kind {
        ErrorKind::NotMatched => not_found_response(),
        ErrorKind::MethodMismatch => {
            let allowed = allowed_from_message(&err.message);
            Response::json(
                405,
                json!({
                    "success": false,
                    "error": "Method Not Allowed",
                    "message": format!("Method {method} not allowed for this endpoint"),
                    "allowedMethods": allowed.clone(),
                }),
            )
            .header("Allow", allowed.join(", "))
        }
        ErrorKind::Validation => Response::json(
            400,
            json!({
                "success": false,
                "error": "Validation Error",
                "message": err.public_message(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }),
        ),
        _ => Response::json(
            err.status,
            json!({
                "success": false,
                "error": crate::response::status_reason(err.status),
                "message": err.public_message(),
            }),
        ),
    }
}

/// `HttpError::method_not_allowed` only carries its allowed set baked into
/// the message; recover it for the `allowedMethods` array.
fn allowed_from_message(message: &str) -> Vec<String> {
    message
        .rsplit_once("allowed: ")
        .map(|(_, rest)| rest.trim_end_matches(')'))
        .map(|rest| rest.split(", ").map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxedHandler, HandlerContext};
    use crate::middleware::{Middleware, Next};
    use crate::response_mapper::Returned;
    use crate::route::{Route, RouteGroup};
    use crate::validator::SchemaConfig;
    use serde_json::json;

    fn echo_params() -> BoxedHandler {
        Arc::new(|ctx: HandlerContext<'_>| Ok(Returned::from(ctx.params)))
    }

    #[test]
    fn dispatches_matched_route_and_attaches_params() {
        let tree = RouteTree::new("").route(Route::new(Method::GET, "/users/:id", echo_params()));
        let dispatcher = Dispatcher::new(tree).unwrap();
        let mut req = Request::new(Method::GET, "/users/42");
        let res = dispatcher.dispatch(&mut req);
        assert_eq!(res.status, 200);
        match res.body {
            crate::response::Body::Json(v) => assert_eq!(v["id"], "42"),
            _ => panic!("expected json body"),
        }
    }

    #[test]
    fn unmatched_path_returns_not_found_wire_shape() {
        let dispatcher = Dispatcher::new(RouteTree::new("")).unwrap();
        let mut req = Request::new(Method::GET, "/nope");
        let res = dispatcher.dispatch(&mut req);
        assert_eq!(res.status, 404);
        match res.body {
            crate::response::Body::Json(v) => assert_eq!(v["error"], "Not Found"),
            _ => panic!("expected json body"),
        }
    }

    #[test]
    fn wrong_method_returns_405_with_allow_header() {
        let tree = RouteTree::new("").route(Route::new(Method::GET, "/users", echo_params()));
        let dispatcher = Dispatcher::new(tree).unwrap();
        let mut req = Request::new(Method::DELETE, "/users");
        let res = dispatcher.dispatch(&mut req);
        assert_eq!(res.status, 405);
        assert_eq!(res.headers.get("Allow"), Some(&"GET".to_string()));
    }

    #[test]
    fn options_request_reports_allowed_methods_without_dispatching() {
        let tree = RouteTree::new("")
            .route(Route::new(Method::GET, "/users", echo_params()))
            .route(Route::new(Method::POST, "/users", echo_params()));
        let dispatcher = Dispatcher::new(tree).unwrap();
        let mut req = Request::new(Method::OPTIONS, "/users");
        let res = dispatcher.dispatch(&mut req);
        assert_eq!(res.status, 204);
        let allow = res.headers.get("Allow").unwrap();
        assert!(allow.contains("GET") && allow.contains("POST"));
    }

    #[test]
    fn options_on_an_unregistered_path_still_returns_204() {
        let dispatcher = Dispatcher::new(RouteTree::new("")).unwrap();
        let mut req = Request::new(Method::OPTIONS, "/nope");
        let res = dispatcher.dispatch(&mut req);
        assert_eq!(res.status, 204);
        assert!(res.headers.get("Allow").is_none());
    }

    #[test]
    fn validation_failure_returns_bit_exact_wire_shape() {
        let schema = SchemaConfig {
            body: Some(json!({"type": "object", "required": ["name"]})),
            ..Default::default()
        };
        let tree = RouteTree::new("").route(
            Route::new(Method::POST, "/users", echo_params()).schema(schema),
        );
        let dispatcher = Dispatcher::new(tree).unwrap();
        let mut req = Request::new(Method::POST, "/users")
            .with_header("content-type", "application/json")
            .with_body(b"{}".to_vec());
        let res = dispatcher.dispatch(&mut req);
        assert_eq!(res.status, 400);
        match res.body {
            crate::response::Body::Json(v) => {
                assert_eq!(v["success"], false);
                assert_eq!(v["error"], "Validation Error");
                assert!(v["timestamp"].is_string());
            }
            _ => panic!("expected json body"),
        }
    }

    #[test]
    fn global_middleware_runs_ahead_of_route_middleware() {
        struct Marker(Arc<std::sync::Mutex<Vec<&'static str>>>, &'static str);
        impl Middleware for Marker {
            fn handle(&self, req: &mut Request, next: Next<'_>) -> Result<Response, HttpError> {
                self.0.lock().unwrap().push(self.1);
                next.call(req)
            }
        }

        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let tree = RouteTree::new("").route(
            Route::new(Method::GET, "/x", echo_params())
                .middleware(Arc::new(Marker(log.clone(), "route"))),
        );
        let dispatcher = Dispatcher::new(tree).unwrap();
        dispatcher.add_global_middleware(Arc::new(Marker(log.clone(), "global")));

        let mut req = Request::new(Method::GET, "/x");
        dispatcher.dispatch(&mut req);
        assert_eq!(*log.lock().unwrap(), vec!["global", "route"]);
    }

    #[test]
    fn strict_router_config_rejects_duplicate_routes_in_a_single_batch() {
        let dispatcher = Dispatcher::new(RouteTree::new(""))
            .unwrap()
            .with_router_config(RouterConfig {
                fail_on_duplicate_routes: true,
            });

        let result = dispatcher.add_routes(
            RouteGroup::new("")
                .route(Route::new(Method::GET, "/dup", echo_params()))
                .route(Route::new(Method::GET, "/dup", echo_params())),
        );
        if cfg!(debug_assertions) {
            assert!(result.is_err());
        } else {
            assert!(result.is_ok());
        }
    }

    #[test]
    fn add_routes_registers_dynamically() {
        let dispatcher = Dispatcher::new(RouteTree::new("")).unwrap();
        assert_eq!(dispatcher.route_count(), 0);
        dispatcher
            .add_routes(RouteGroup::new("").route(Route::new(Method::GET, "/late", echo_params())))
            .unwrap();
        assert_eq!(dispatcher.route_count(), 1);
        let mut req = Request::new(Method::GET, "/late");
        assert_eq!(dispatcher.dispatch(&mut req).status, 200);
    }
}
