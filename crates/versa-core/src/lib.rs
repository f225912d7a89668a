//! # versa-core
//!
//! HTTP engine of versa: hyper server, matchit router, extractors, and the
//! versioned dispatch that sits between the router and user handlers.
//!
//! This crate is not meant to be used directly. Use `versa` instead.

mod app;
mod dispatch;
mod error;
mod extract;
mod handler;
mod request;
mod response;
mod router;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

// Public API
pub use app::{RouteTableEntry, Versa};
pub use dispatch::VersionedDispatch;
pub use error::{ApiError, Result};
pub use extract::{ApiVersion, Body, FromRequest, FromRequestParts, Headers, Json, Path};
pub use handler::{into_boxed_handler, BoxedHandler, BoxedRoute, Handler};
pub use request::Request;
pub use response::{IntoResponse, Redirect, Response};
pub use router::{delete, get, patch, post, put, MethodRouter, RouteInfo, RouteMatch, Router};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};

pub use versa_versioning::{
    ResolvedVersion, VersionSource, VersionedRoute, VersioningConfig, VersioningError,
};
