//! # versa-versioning
//!
//! Version negotiation primitives for versa.
//!
//! Handlers are registered against a `(method, path)` pair with a version
//! label. At startup the [`VersionRegistry`] is expanded into concrete
//! [`MountPoint`]s for the underlying router; at request time the
//! [`VersionResolver`] decides which registered version the caller asked for.
//!
//! Resolution precedence, first match wins:
//!
//! 1. a version segment in the URL (`/v1/users`)
//! 2. the configured request header (`api-version: v1`)
//! 3. a `version` parameter on the `Accept` media type
//!    (`Accept: application/vnd.acme.users;version=v1`)
//! 4. the group's default version
//!
//! # Example
//!
//! ```rust,ignore
//! use versa_versioning::{materialize, VersionRegistry, VersionedRoute, VersioningConfig};
//!
//! let settings = VersioningConfig::default().prefix("/api").validate()?;
//! let mut registry = VersionRegistry::new(settings.default_version().clone());
//!
//! registry.register(VersionedRoute::get("/users", list_v1).version("v1"))?;
//! registry.register(VersionedRoute::get("/users", list_v2).version("v2").default())?;
//!
//! for mount in materialize(&registry, &settings) {
//!     println!("{} {}", mount.method, mount.path);
//! }
//! // GET /api/v1/users
//! // GET /api/v2/users
//! // GET /api/users
//! ```

pub mod accept;
mod config;
mod error;
mod label;
mod materialize;
mod registry;
mod resolver;

pub use config::{
    VersionSettings, VersioningConfig, DEFAULT_PREFIX, DEFAULT_REQUEST_HEADER,
    DEFAULT_RESPONSE_HEADER, DEFAULT_VERSION,
};
pub use error::{ConfigError, MountError, RegistrationError, Result, VersioningError};
pub use label::VersionLabel;
pub use materialize::{materialize, mount_all, MountKind, MountPoint, MountTarget};
pub use registry::{RouteGroup, RouteKey, VersionRegistry, VersionedRoute};
pub use resolver::{NegotiationInputs, ResolvedVersion, VersionResolver, VersionSource};
