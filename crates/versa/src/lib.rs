//! # versa
//!
//! API-version negotiation and dispatch for HTTP services.
//!
//! Register several versions of the same `(method, path)` and let versa pick
//! one per request. The version comes from, in order:
//!
//! 1. the URL (`/v1/users`, always mounted)
//! 2. the `api-version` request header
//! 3. the `version` parameter of the `Accept` media type
//! 4. the route's default version
//!
//! Every versioned response carries a `version` header naming the version
//! that served it. With redirect mode on, a negotiated request for a version
//! other than the default is answered with `302 Found` pointing at the
//! canonical versioned URL.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use versa::prelude::*;
//!
//! async fn users_v1() -> &'static str { "users v1" }
//! async fn users_v2() -> &'static str { "users v2" }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     Versa::new()
//!         .versioning(VersioningConfig::default().prefix("/api"))
//!         .routev(VersionedRoute::get("/users", users_v1).version("v1"))
//!         .routev(VersionedRoute::get("/users", users_v2).version("v2").default())
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `config` (default) - `.env` loading and `VERSA_*` environment configuration
//! - `test-utils` - in-process `TestClient`

// Re-export core functionality
pub use versa_core::*;

/// Versioning primitives: registry, resolver, materializer
pub use versa_versioning as versioning;

#[cfg(feature = "config")]
pub mod config;

/// Prelude module - import everything you need with `use versa::prelude::*`
pub mod prelude {
    pub use versa_core::{
        delete, get, patch, post, put, ApiError, ApiVersion, Body, BoxedRoute, Headers,
        IntoResponse, Json, MethodRouter, Path, Redirect, Request, Response, Result, Router,
        Versa, VersionedRoute, VersioningConfig,
    };

    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}
