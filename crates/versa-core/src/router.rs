//! Router implementation using radix tree (matchit)
//!
//! Routes are registered using path patterns and HTTP method handlers.
//! Dynamic segments use `{param}` syntax:
//!
//! - `/users` - Static path
//! - `/users/{id}` - Single parameter
//! - `/users/{user_id}/posts/{post_id}` - Multiple parameters
//!
//! # Example
//!
//! ```rust,ignore
//! use versa_core::{Router, get, post};
//!
//! let mut router = Router::new();
//! router.try_route("/users", get(list_users).post(create_user))?;
//! router.try_route("/users/{id}", get(get_user))?;
//! ```
//!
//! Versioned routes reach the router through [`MountTarget`], one mount point
//! at a time. Mounting a second method on an existing path merges it into
//! that path's [`MethodRouter`].

use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use http::Method;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use tracing::trace;
use versa_versioning::{MountError, MountTarget};

/// A registered path and the methods bound on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// The original path pattern (e.g., "/users/{id}")
    pub path: String,
    /// Methods in registration order
    pub methods: Vec<Method>,
}

/// HTTP method router for a single path
#[derive(Clone, Default)]
pub struct MethodRouter {
    handlers: Vec<(Method, BoxedHandler)>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for a specific method, replacing any previous one
    pub fn on<H, T>(self, method: Method, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.on_boxed(method, into_boxed_handler(handler))
    }

    pub fn get<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::GET, handler)
    }

    pub fn post<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::POST, handler)
    }

    pub fn put<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PUT, handler)
    }

    pub fn patch<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::PATCH, handler)
    }

    pub fn delete<H: Handler<T>, T: 'static>(self, handler: H) -> Self {
        self.on(Method::DELETE, handler)
    }

    pub(crate) fn on_boxed(mut self, method: Method, handler: BoxedHandler) -> Self {
        match self.handlers.iter_mut().find(|(m, _)| *m == method) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((method, handler)),
        }
        self
    }

    pub(crate) fn get_handler(&self, method: &Method) -> Option<&BoxedHandler> {
        self.handlers
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler)
    }

    /// Methods for the `Allow` header of a 405 response
    pub(crate) fn allowed_methods(&self) -> Vec<Method> {
        self.handlers.iter().map(|(m, _)| m.clone()).collect()
    }

    pub(crate) fn contains(&self, method: &Method) -> bool {
        self.get_handler(method).is_some()
    }

    fn into_handlers(self) -> Vec<(Method, BoxedHandler)> {
        self.handlers
    }
}

/// Create a GET route handler
pub fn get<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().get(handler)
}

/// Create a POST route handler
pub fn post<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().post(handler)
}

/// Create a PUT route handler
pub fn put<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().put(handler)
}

/// Create a PATCH route handler
pub fn patch<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().patch(handler)
}

/// Create a DELETE route handler
pub fn delete<H: Handler<T>, T: 'static>(handler: H) -> MethodRouter {
    MethodRouter::new().delete(handler)
}

struct Entry {
    path: String,
    methods: MethodRouter,
}

/// Main router
///
/// Immutable once the server starts.
pub struct Router {
    inner: MatchitRouter<usize>,
    entries: Vec<Entry>,
    /// matchit path -> index into `entries`
    paths: HashMap<String, usize>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            inner: MatchitRouter::new(),
            entries: Vec::new(),
            paths: HashMap::new(),
        }
    }

    /// Add every method of `method_router` on `path`
    pub fn try_route(&mut self, path: &str, method_router: MethodRouter) -> Result<(), MountError> {
        for (method, handler) in method_router.into_handlers() {
            self.insert(method, path, handler)?;
        }
        Ok(())
    }

    fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), MountError> {
        let matchit_path = convert_path_params(path);

        if let Some(&index) = self.paths.get(&matchit_path) {
            let entry = &mut self.entries[index];
            if entry.methods.contains(&method) {
                return Err(MountError::Duplicate {
                    method,
                    path: path.to_string(),
                });
            }
            entry.methods = std::mem::take(&mut entry.methods).on_boxed(method, handler);
            return Ok(());
        }

        let index = self.entries.len();
        if let Err(e) = self.inner.insert(matchit_path.clone(), index) {
            let existing = self
                .find_conflicting_route(&matchit_path)
                .unwrap_or("<unknown>")
                .to_string();
            return Err(MountError::Conflict {
                path: path.to_string(),
                existing,
                details: e.to_string(),
            });
        }

        trace!(method = %method, path = %path, "Route mounted");
        self.paths.insert(matchit_path, index);
        self.entries.push(Entry {
            path: path.to_string(),
            methods: MethodRouter::new().on_boxed(method, handler),
        });
        Ok(())
    }

    /// Registered path with the same shape as `matchit_path`
    fn find_conflicting_route(&self, matchit_path: &str) -> Option<&str> {
        let normalized_new = normalize_path_for_comparison(matchit_path);

        self.paths
            .iter()
            .find(|(registered, _)| normalize_path_for_comparison(registered) == normalized_new)
            .map(|(_, &index)| self.entries[index].path.as_str())
    }

    /// Match a request and return the handler + params
    pub fn match_route(&self, path: &str, method: &Method) -> RouteMatch<'_> {
        match self.inner.at(path) {
            Ok(matched) => {
                let method_router = &self.entries[*matched.value].methods;

                if let Some(handler) = method_router.get_handler(method) {
                    let params: HashMap<String, String> = matched
                        .params
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();

                    RouteMatch::Found { handler, params }
                } else {
                    RouteMatch::MethodNotAllowed {
                        allowed: method_router.allowed_methods(),
                    }
                }
            }
            Err(_) => RouteMatch::NotFound,
        }
    }

    /// Registered routes in registration order
    pub fn registered_routes(&self) -> Vec<RouteInfo> {
        self.entries
            .iter()
            .map(|entry| RouteInfo {
                path: entry.path.clone(),
                methods: entry.methods.allowed_methods(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl MountTarget<BoxedHandler> for Router {
    fn mount(&mut self, method: Method, path: &str, handler: BoxedHandler) -> Result<(), MountError> {
        self.insert(method, path, handler)
    }
}

/// Result of route matching
pub enum RouteMatch<'a> {
    Found {
        handler: &'a BoxedHandler,
        params: HashMap<String, String>,
    },
    NotFound,
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
}

/// Convert {param} style to :param for matchit
fn convert_path_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());

    for ch in path.chars() {
        match ch {
            '{' => result.push(':'),
            '}' => {}
            _ => result.push(ch),
        }
    }

    result
}

/// Replace parameter names with a placeholder so `/:id` and `/:user_id` compare equal
fn normalize_path_for_comparison(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with(':') { ":" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use versa_versioning::{materialize, mount_all, VersionRegistry, VersionedRoute, VersioningConfig};

    fn tagged(tag: &'static str) -> BoxedHandler {
        into_boxed_handler(move || async move { tag })
    }

    fn is_routed(router: &Router, path: &str) -> bool {
        matches!(router.match_route(path, &Method::GET), RouteMatch::Found { .. })
    }

    #[test]
    fn test_convert_path_params() {
        assert_eq!(convert_path_params("/users/{id}"), "/users/:id");
        assert_eq!(
            convert_path_params("/users/{user_id}/posts/{post_id}"),
            "/users/:user_id/posts/:post_id"
        );
        assert_eq!(convert_path_params("/static"), "/static");
    }

    #[test]
    fn test_normalize_path_for_comparison() {
        assert_eq!(normalize_path_for_comparison("/users/:id"), "/users/:");
        assert_eq!(
            normalize_path_for_comparison("/users/:user_id"),
            normalize_path_for_comparison("/users/:id")
        );
    }

    #[test]
    fn test_methods_merge_on_same_path() {
        let mut router = Router::new();
        router.mount(Method::GET, "/test", tagged("get")).unwrap();
        router.mount(Method::POST, "/test", tagged("post")).unwrap();

        assert_eq!(router.len(), 1);
        assert_eq!(
            router.registered_routes(),
            vec![RouteInfo {
                path: "/test".to_string(),
                methods: vec![Method::GET, Method::POST],
            }]
        );
    }

    #[test]
    fn test_duplicate_method_is_refused() {
        let mut router = Router::new();
        router.mount(Method::GET, "/test", tagged("a")).unwrap();
        let err = router.mount(Method::GET, "/test", tagged("b")).unwrap_err();
        assert!(matches!(err, MountError::Duplicate { ref path, .. } if path == "/test"));
    }

    #[test]
    fn test_conflicting_param_names_are_refused() {
        let mut router = Router::new();
        router.mount(Method::GET, "/users/{id}", tagged("a")).unwrap();
        let err = router
            .mount(Method::POST, "/users/{user_id}", tagged("b"))
            .unwrap_err();

        match err {
            MountError::Conflict { path, existing, .. } => {
                assert_eq!(path, "/users/{user_id}");
                assert_eq!(existing, "/users/{id}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_match_route_with_params() {
        let mut router = Router::new();
        router.try_route("/users/{id}", get(|| async { "user" })).unwrap();

        match router.match_route("/users/42", &Method::GET) {
            RouteMatch::Found { params, .. } => assert_eq!(params.get("id").unwrap(), "42"),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let mut router = Router::new();
        router
            .try_route("/items", get(|| async { "list" }).post(|| async { "create" }))
            .unwrap();

        match router.match_route("/items", &Method::DELETE) {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            _ => panic!("expected 405"),
        }
        assert!(matches!(router.match_route("/nope", &Method::GET), RouteMatch::NotFound));
    }

    #[test]
    fn test_method_router_on_replaces() {
        let methods = get(|| async { "a" }).get(|| async { "b" });
        assert_eq!(methods.allowed_methods(), vec![Method::GET]);
    }

    fn versioned_mounts(prefix: &str) -> Vec<versa_versioning::MountPoint<BoxedHandler>> {
        let settings = VersioningConfig::default().prefix(prefix).validate().unwrap();
        let mut registry = VersionRegistry::new(settings.default_version().clone());
        registry
            .register(VersionedRoute::get("/", tagged("root 1")).version("v1").default())
            .unwrap();
        for (version, tag) in [("v1", "version 1"), ("v2", "version 2"), ("v3", "version 3")] {
            let mut route = VersionedRoute::get("/test", tagged(tag)).version(version);
            if version == "v2" {
                route = route.default();
            }
            registry.register(route).unwrap();
        }
        registry
            .register(VersionedRoute::get("/users/{id}", tagged("user")).version("v1"))
            .unwrap();
        materialize(&registry, &settings)
    }

    const SAMPLE_PATHS: &[&str] = &[
        "/", "/v1", "/test", "/v1/test", "/v2/test", "/v3/test", "/v4/test", "/users/7",
        "/v1/users/7", "/api", "/api/test",
    ];

    fn mount_order() -> impl Strategy<Value = Vec<usize>> {
        Just((0..versioned_mounts("/").len()).collect::<Vec<_>>()).prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_mount_order_does_not_change_matching(order in mount_order()) {
            let mut forward = Router::new();
            mount_all(versioned_mounts("/"), &mut forward).unwrap();

            let mut mounts: Vec<_> = versioned_mounts("/").into_iter().map(Some).collect();
            let reordered = order.iter().filter_map(|&i| mounts[i].take()).collect();
            let mut shuffled = Router::new();
            mount_all(reordered, &mut shuffled).unwrap();

            for path in SAMPLE_PATHS {
                prop_assert_eq!(is_routed(&forward, path), is_routed(&shuffled, path));
            }
        }
    }

    #[test]
    fn test_versioned_mounts_under_prefix() {
        let mut router = Router::new();
        mount_all(versioned_mounts("/api"), &mut router).unwrap();

        for path in ["/api", "/api/v1", "/api/test", "/api/v2/test", "/api/v1/users/9"] {
            assert!(is_routed(&router, path), "{path} should match");
        }
        assert!(!is_routed(&router, "/test"));
        assert!(!is_routed(&router, "/api/v4/test"));
    }
}
