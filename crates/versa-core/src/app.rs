//! Versa application builder

use crate::dispatch::VersionedDispatch;
use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use crate::router::{MethodRouter, Router};
use crate::server::Server;
use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use versa_versioning::{
    materialize, mount_all, MountKind, MountPoint, VersionRegistry, VersionResolver,
    VersionSettings, VersionedRoute, VersioningConfig, VersioningError,
};

/// Main application builder
///
/// Route declarations are only checked when the application is built, so a
/// bad version label or a conflicting path surfaces from [`Versa::build`] or
/// [`Versa::run`] before any socket is bound.
///
/// # Example
///
/// ```rust,ignore
/// use versa::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     Versa::new()
///         .versioning(VersioningConfig::default().prefix("/api"))
///         .route("/health", get(health))
///         .routev(VersionedRoute::get("/users", list_users_v1).version("v1"))
///         .routev(VersionedRoute::get("/users", list_users_v2).version("v2").default())
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct Versa {
    config: VersioningConfig,
    plain: Vec<(String, MethodRouter)>,
    versioned: Vec<Declaration>,
}

#[derive(Clone)]
enum Declaration {
    Single(VersionedRoute<BoxedHandler>),
    Batch(Vec<VersionedRoute<BoxedHandler>>),
}

impl Versa {
    /// Create a new application with default versioning options
    pub fn new() -> Self {
        // Initialize tracing if not already done
        let _ = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,versa=debug")),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();

        Self {
            config: VersioningConfig::default(),
            plain: Vec::new(),
            versioned: Vec::new(),
        }
    }

    /// Replace the versioning options
    pub fn versioning(mut self, config: VersioningConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an unversioned route, mounted exactly at `path`
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.plain.push((path.to_string(), method_router));
        self
    }

    /// Add one version of a route group
    pub fn routev<H, T>(mut self, route: VersionedRoute<H>) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.versioned
            .push(Declaration::Single(route.map_handler(into_boxed_handler::<H, T>)));
        self
    }

    /// Add several versions at once, all or nothing
    ///
    /// Handlers of different types are boxed up front, see
    /// [`BoxedRoute::boxed`](crate::BoxedRoute::boxed).
    pub fn routev_batch<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = VersionedRoute<BoxedHandler>>,
    {
        self.versioned
            .push(Declaration::Batch(routes.into_iter().collect()));
        self
    }

    /// Validate the options and register every versioned declaration
    fn prepare(&self) -> Result<(Arc<VersionSettings>, VersionRegistry<BoxedHandler>), VersioningError> {
        let settings = Arc::new(self.config.validate()?);
        let mut registry = VersionRegistry::new(settings.default_version().clone());

        for declaration in &self.versioned {
            match declaration.clone() {
                Declaration::Single(route) => registry.register(route)?,
                Declaration::Batch(routes) => registry.register_batch(routes)?,
            }
        }

        Ok((settings, registry))
    }

    /// Every concrete route the application will serve, in mount order
    pub fn routes(&self) -> Result<Vec<RouteTableEntry>, VersioningError> {
        let (settings, registry) = self.prepare()?;
        let mounts = materialize(&registry, &settings);
        Ok(self.table(&registry, &mounts))
    }

    fn table(
        &self,
        registry: &VersionRegistry<BoxedHandler>,
        mounts: &[MountPoint<BoxedHandler>],
    ) -> Vec<RouteTableEntry> {
        let plain = self.plain.iter().flat_map(|(path, methods)| {
            methods.allowed_methods().into_iter().map(|method| RouteTableEntry {
                method,
                path: path.clone(),
                version: None,
                negotiated: false,
            })
        });

        let versioned = mounts.iter().map(|mount| {
            let version = match &mount.kind {
                MountKind::Versioned(label) => Some(label.to_string()),
                MountKind::Unversioned => registry
                    .group(&mount.key)
                    .map(|group| group.default_version().to_string()),
            };
            RouteTableEntry {
                method: mount.method.clone(),
                path: mount.path.clone(),
                version,
                negotiated: mount.kind.is_unversioned(),
            }
        });

        plain.chain(versioned).collect()
    }

    /// Build the router: plain routes first, then every versioned mount point
    pub fn build(self) -> Result<Router, VersioningError> {
        let (settings, registry) = self.prepare()?;
        let mounts = materialize(&registry, &settings);

        for entry in self.table(&registry, &mounts) {
            info!("{}", entry);
        }

        let mut router = Router::new();
        for (path, method_router) in self.plain {
            router.try_route(&path, method_router)?;
        }

        let registry = Arc::new(registry);
        let resolver = VersionResolver::new(settings);
        let mounts: Vec<_> = mounts
            .into_iter()
            .map(|mount| {
                mount.map_handler(|key, kind, _| {
                    VersionedDispatch::new(registry.clone(), resolver.clone(), key.clone(), kind.clone())
                        .into_handler()
                })
            })
            .collect();
        mount_all(mounts, &mut router)?;

        Ok(router)
    }

    /// Build the application and serve it on `addr`
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let router = self.build()?;
        Server::new(router).run(addr).await
    }
}

impl Default for Versa {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of the startup route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTableEntry {
    pub method: Method,
    pub path: String,
    /// Version bound to the path; for negotiated mounts, the group default.
    /// `None` for plain routes.
    pub version: Option<String>,
    /// The version is chosen per request
    pub negotiated: bool,
}

impl fmt::Display for RouteTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} {}", self.method.as_str(), self.path)?;
        match (&self.version, self.negotiated) {
            (Some(version), true) => write!(f, " -> {} (negotiated)", version),
            (Some(version), false) => write!(f, " -> {}", version),
            (None, _) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::get;
    use crate::BoxedRoute;
    use versa_versioning::RegistrationError;

    async fn v1() -> &'static str {
        "version 1"
    }

    async fn v2() -> &'static str {
        "version 2"
    }

    #[test]
    fn test_route_table() {
        let app = Versa::new()
            .versioning(VersioningConfig::default().prefix("/api"))
            .route("/health", get(|| async { "ok" }))
            .routev(VersionedRoute::get("/test", v1).version("v1"))
            .routev(VersionedRoute::get("/test", v2).version("v2").default());

        let table = app.routes().unwrap();
        let lines: Vec<String> = table.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "GET     /health",
                "GET     /api/v1/test -> v1",
                "GET     /api/v2/test -> v2",
                "GET     /api/test -> v2 (negotiated)",
            ]
        );
    }

    #[test]
    fn test_invalid_label_surfaces_at_build() {
        let app = Versa::new().routev(VersionedRoute::get("/test", v1).version("v/1"));
        let err = app.build().err().unwrap();
        assert!(matches!(
            err,
            VersioningError::Registration(RegistrationError::InvalidVersionLabel { .. })
        ));
    }

    #[test]
    fn test_invalid_config_surfaces_at_build() {
        let app = Versa::new().versioning(VersioningConfig::default().header("bad header"));
        assert!(matches!(app.build(), Err(VersioningError::Config(_))));
    }

    #[test]
    fn test_plain_route_conflicting_with_mount() {
        let app = Versa::new()
            .route("/v1/test", get(|| async { "plain" }))
            .routev(VersionedRoute::get("/test", v1).version("v1"));
        let err = app.build().err().unwrap();
        assert!(matches!(
            err,
            VersioningError::Registration(RegistrationError::Mount(_))
        ));
    }

    #[test]
    fn test_batch_with_conflicting_defaults() {
        let app = Versa::new().routev_batch([
            VersionedRoute::get("/test", v1).version("v1").default().boxed(),
            VersionedRoute::get("/test", v2).version("v2").default().boxed(),
        ]);
        let err = app.build().err().unwrap();
        assert!(matches!(
            err,
            VersioningError::Registration(RegistrationError::ConflictingDefaults { .. })
        ));
    }

    #[test]
    fn test_untagged_routes_use_configured_default_version() {
        let app = Versa::new()
            .versioning(VersioningConfig::default().default_version("2024-01"))
            .routev(VersionedRoute::get("/generic", v1));

        let paths: Vec<String> = app.routes().unwrap().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/2024-01/generic", "/generic"]);
    }
}
