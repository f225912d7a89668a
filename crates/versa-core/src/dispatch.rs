//! Versioned dispatch
//!
//! Every mount point of a versioned route group is bound to a
//! [`VersionedDispatch`] rather than to the user's handler. At request time it
//! resolves the version, picks the handler registered for it and stamps the
//! response with the version that was served.
//!
//! ```text
//! request ─► resolve ─► registered? ──no──► 404
//!                           │yes
//!                           ▼
//!                  redirect mode, unversioned mount,
//!                  negotiated, not the default? ──yes──► 302 Location: /prefix/vN/...
//!                           │no
//!                           ▼
//!                        handler
//! ```
//!
//! The response header is set on all three outcomes.

use crate::error::ApiError;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::{IntoResponse, Redirect, Response};
use http::HeaderValue;
use std::sync::Arc;
use tracing::{debug, error, trace};
use versa_versioning::{
    MountKind, NegotiationInputs, ResolvedVersion, RouteGroup, RouteKey, VersionRegistry,
    VersionResolver,
};

/// Version-aware handler bound to one mount point of a route group
#[derive(Clone)]
pub struct VersionedDispatch {
    registry: Arc<VersionRegistry<BoxedHandler>>,
    resolver: VersionResolver,
    key: RouteKey,
    kind: MountKind,
}

impl VersionedDispatch {
    pub fn new(
        registry: Arc<VersionRegistry<BoxedHandler>>,
        resolver: VersionResolver,
        key: RouteKey,
        kind: MountKind,
    ) -> Self {
        Self {
            registry,
            resolver,
            key,
            kind,
        }
    }

    /// Type-erase into a router handler
    pub fn into_handler(self) -> BoxedHandler {
        let this = Arc::new(self);
        Arc::new(move |req| {
            let this = this.clone();
            Box::pin(async move { this.dispatch(req).await })
        })
    }

    pub async fn dispatch(&self, req: Request) -> Response {
        let Some(group) = self.registry.group(&self.key) else {
            error!(route = %self.key, "Mount point bound to an unregistered route group");
            return ApiError::internal("Route is not registered").into_response();
        };

        let resolved = {
            let inputs = NegotiationInputs::from_headers(
                req.path(),
                req.headers(),
                self.resolver.settings().header(),
            );
            self.resolver.resolve_mount(group, &self.kind, &inputs)
        };

        debug!(
            method = %req.method(),
            path = %req.path(),
            version = %resolved.version,
            source = %resolved.source,
            "Resolved API version"
        );

        let mut response = self.respond(group, &resolved, req).await;
        self.stamp(&mut response, &resolved.version);
        response
    }

    async fn respond(
        &self,
        group: &RouteGroup<BoxedHandler>,
        resolved: &ResolvedVersion,
        mut req: Request,
    ) -> Response {
        let Some(handler) = group.handler(&resolved.version) else {
            debug!(route = %self.key, version = %resolved.version, "Requested version is not registered");
            return ApiError::not_found(format!(
                "Version {} is not available for {}",
                resolved.version, self.key
            ))
            .into_response();
        };

        if self.should_redirect(group, resolved) {
            let location = self.location(&req, &resolved.version);
            debug!(route = %self.key, version = %resolved.version, location = %location, "Redirecting to versioned path");
            return match Redirect::to(&location) {
                Ok(redirect) => redirect.into_response(),
                Err(e) => ApiError::from(e).into_response(),
            };
        }

        req.extensions_mut().insert(resolved.clone());
        handler(req).await
    }

    fn should_redirect(&self, group: &RouteGroup<BoxedHandler>, resolved: &ResolvedVersion) -> bool {
        self.resolver.settings().redirect()
            && self.kind.is_unversioned()
            && resolved.is_negotiated()
            && !group.is_default(&resolved.version)
    }

    /// Canonical versioned URL for the current request
    fn location(&self, req: &Request, version: &str) -> String {
        let settings = self.resolver.settings();
        let rest = match settings.strip_prefix(req.path()) {
            Some("") | None => "/",
            Some(rest) => rest,
        };

        let mut location = settings.versioned_path(version, rest);
        if let Some(query) = req.query_string() {
            location.push('?');
            location.push_str(query);
        }
        location
    }

    fn stamp(&self, response: &mut Response, version: &str) {
        match HeaderValue::from_str(version) {
            Ok(value) => {
                response
                    .headers_mut()
                    .insert(self.resolver.settings().response_header().clone(), value);
            }
            Err(_) => trace!(version = %version, "Version is not a valid header value"),
        }
    }
}
