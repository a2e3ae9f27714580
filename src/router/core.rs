use crate::flatten::FlattenedRoute;
use crate::path::{match_path, ParamVec};
use arc_swap::ArcSwap;
use http::Method;
use std::sync::Arc;

/// Configuration governing how the route table is built and maintained.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether a duplicate `(method, path)` registration is a hard error
    /// rather than a `tracing::warn!` diagnostic. Only enforced in debug
    /// builds, so a release binary never fails to start over a diagnostic.
    pub fail_on_duplicate_routes: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            fail_on_duplicate_routes: false,
        }
    }
}

/// Holds the flattened, priority-ordered route table behind an [`ArcSwap`]
/// so the hot path (matching) never blocks on a writer, and routes can be
/// registered dynamically after construction.
///
/// Ordering: routes are sorted by descending specificity score; equal
/// scores preserve registration order (a stable sort).
pub struct Router {
    routes: ArcSwap<Vec<Arc<FlattenedRoute>>>,
}

impl Router {
    pub fn new(routes: Vec<FlattenedRoute>) -> Self {
        Router {
            routes: ArcSwap::from_pointee(sorted(wrap(routes))),
        }
    }

    /// Replace the route table wholesale, e.g. at startup.
    pub fn set_routes(&self, routes: Vec<FlattenedRoute>) {
        self.routes.store(Arc::new(sorted(wrap(routes))));
    }

    /// Append routes to the existing table, re-sorting by specificity.
    /// Used to register routes dynamically after construction.
    pub fn append(&self, additional: Vec<FlattenedRoute>) {
        let mut routes: Vec<Arc<FlattenedRoute>> = (**self.routes.load()).clone();
        routes.extend(wrap(additional));
        self.routes.store(Arc::new(sorted(routes)));
    }

    pub fn route_count(&self) -> usize {
        self.routes.load().len()
    }

    /// Match `method`/`path` against the table in priority order, returning
    /// the first route whose pattern matches the path and whose method
    /// matches too. If the path matches one or more routes but none for this
    /// method, reports the allowed method set for a 405.
    pub fn match_request(&self, method: &Method, path: &str) -> MatchOutcomeOwned {
        let table = self.routes.load();
        let mut allowed: Vec<Method> = Vec::new();

        for (idx, route) in table.iter().enumerate() {
            if let Some(m) = match_path(&route.pattern, path) {
                if &route.method == method {
                    return MatchOutcomeOwned::Matched { index: idx, params: m.params };
                }
                if !allowed.contains(&route.method) {
                    allowed.push(route.method.clone());
                }
            }
        }

        if allowed.is_empty() {
            MatchOutcomeOwned::NotFound
        } else {
            MatchOutcomeOwned::MethodMismatch(allowed)
        }
    }

    /// All methods registered for a path, used to answer `OPTIONS` requests.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let table = self.routes.load();
        let mut allowed = Vec::new();
        for route in table.iter() {
            if match_path(&route.pattern, path).is_some() && !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }
        allowed
    }

    /// Run `f` against the route at `index` in the currently-loaded table.
    /// Used by the dispatcher to invoke a matched route's handler chain
    /// without holding a borrow across the `ArcSwap` guard's lifetime.
    pub fn with_route<R>(&self, index: usize, f: impl FnOnce(&FlattenedRoute) -> R) -> Option<R> {
        let table = self.routes.load();
        table.get(index).map(|r| f(r))
    }

    /// Project every route in the current table through `f`, in priority
    /// order. Used by [`crate::registry`] to build a read-only view that
    /// carries no compiled pattern or handler closure.
    pub fn snapshot<R>(&self, f: impl Fn(&FlattenedRoute) -> R) -> Vec<R> {
        self.routes.load().iter().map(|r| f(r)).collect()
    }
}

/// An owned match result: holds an index into the table rather than a
/// borrow, so it can outlive the `ArcSwap` load guard.
pub enum MatchOutcomeOwned {
    Matched { index: usize, params: ParamVec },
    MethodMismatch(Vec<Method>),
    NotFound,
}

fn wrap(routes: Vec<FlattenedRoute>) -> Vec<Arc<FlattenedRoute>> {
    routes.into_iter().map(Arc::new).collect()
}

fn sorted(mut routes: Vec<Arc<FlattenedRoute>>) -> Vec<Arc<FlattenedRoute>> {
    routes.sort_by(|a, b| b.pattern.score.cmp(&a.pattern.score));
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response_mapper::Returned;
    use crate::route::Route;
    use crate::flatten::flatten;
    use crate::route::RouteTree;
    use std::sync::Arc;

    fn noop() -> crate::handler::BoxedHandler {
        Arc::new(|_ctx| Ok(Returned::Null))
    }

    #[test]
    fn static_route_beats_parameterized_route() {
        let tree = RouteTree::new("")
            .route(Route::new(Method::GET, "/users/admin", noop()))
            .route(Route::new(Method::GET, "/users/:id", noop()));
        let router = Router::new(flatten(tree, &RouterConfig::default()).unwrap());

        match router.match_request(&Method::GET, "/users/admin") {
            MatchOutcomeOwned::Matched { index, .. } => {
                router.with_route(index, |r| assert_eq!(r.path, "/users/admin"));
            }
            _ => panic!("expected a match"),
        }

        match router.match_request(&Method::GET, "/users/123") {
            MatchOutcomeOwned::Matched { index, .. } => {
                router.with_route(index, |r| assert_eq!(r.path, "/users/:id"));
            }
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn method_mismatch_reports_allowed_methods() {
        let tree = RouteTree::new("").route(Route::new(Method::GET, "/users", noop()));
        let router = Router::new(flatten(tree, &RouterConfig::default()).unwrap());

        match router.match_request(&Method::DELETE, "/users") {
            MatchOutcomeOwned::MethodMismatch(allowed) => assert_eq!(allowed, vec![Method::GET]),
            _ => panic!("expected method mismatch"),
        }
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let tree = RouteTree::new("").route(Route::new(Method::GET, "/users", noop()));
        let router = Router::new(flatten(tree, &RouterConfig::default()).unwrap());
        assert!(matches!(router.match_request(&Method::GET, "/nope"), MatchOutcomeOwned::NotFound));
    }

    #[test]
    fn set_routes_swaps_table_without_blocking_readers() {
        let router = Router::new(Vec::new());
        assert_eq!(router.route_count(), 0);
        let tree = RouteTree::new("").route(Route::new(Method::GET, "/x", noop()));
        router.set_routes(flatten(tree, &RouterConfig::default()).unwrap());
        assert_eq!(router.route_count(), 1);
    }
}
