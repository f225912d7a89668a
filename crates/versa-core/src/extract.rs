//! Extractors for versa
//!
//! Extractors parse data out of incoming requests before a handler runs.

use crate::error::{ApiError, Result};
use crate::request::Request;
use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::ops::Deref;
use std::str::FromStr;
use versa_versioning::{ResolvedVersion, VersionSource};

/// Trait for extracting data from request parts (headers, path, extensions)
///
/// This is used for extractors that don't need the request body.
pub trait FromRequestParts: Sized {
    fn from_request_parts(req: &Request) -> Result<Self>;
}

/// Trait for extracting data from the full request (including body)
pub trait FromRequest: Sized {
    fn from_request(req: &mut Request) -> impl Future<Output = Result<Self>> + Send;
}

impl<T: FromRequestParts> FromRequest for T {
    async fn from_request(req: &mut Request) -> Result<Self> {
        T::from_request_parts(req)
    }
}

/// JSON body extractor, also usable as a response
///
/// # Example
///
/// ```rust,ignore
/// async fn create_user(Json(body): Json<CreateUser>) -> impl IntoResponse {
///     Json(body)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned + Send> FromRequest for Json<T> {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;

        let value: T = serde_json::from_slice(&body)?;
        Ok(Json(value))
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Path parameter extractor
///
/// For route `/users/{id}`:
///
/// ```rust,ignore
/// async fn get_user(Path(id): Path<i64>) -> impl IntoResponse {
///     // id is extracted from path
/// }
/// ```
///
/// With several parameters the value is ambiguous; use
/// [`Request::path_param`] through a custom extractor instead.
#[derive(Debug, Clone)]
pub struct Path<T>(pub T);

impl<T: FromStr> FromRequestParts for Path<T>
where
    T::Err: std::fmt::Display,
{
    fn from_request_parts(req: &Request) -> Result<Self> {
        let Some(value) = req.path_params().values().next() else {
            return Err(ApiError::internal("Missing path parameter"));
        };

        value
            .parse::<T>()
            .map(Path)
            .map_err(|e| ApiError::bad_request(format!("Invalid path parameter: {}", e)))
    }
}

impl<T> Deref for Path<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Raw body bytes extractor
#[derive(Debug, Clone)]
pub struct Body(pub Bytes);

impl FromRequest for Body {
    async fn from_request(req: &mut Request) -> Result<Self> {
        let body = req
            .take_body()
            .ok_or_else(|| ApiError::internal("Body already consumed"))?;
        Ok(Body(body))
    }
}

impl Deref for Body {
    type Target = Bytes;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Copy of the request headers
#[derive(Debug, Clone)]
pub struct Headers(pub HeaderMap);

impl FromRequestParts for Headers {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(Headers(req.headers().clone()))
    }
}

impl Deref for Headers {
    type Target = HeaderMap;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The API version the request was dispatched to
///
/// Only available on routes registered with a version; elsewhere extraction
/// fails with a 500.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(version: ApiVersion) -> String {
///     format!("served by {} ({})", version.as_str(), version.source())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(pub ResolvedVersion);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0.version
    }

    pub fn source(&self) -> VersionSource {
        self.0.source
    }
}

impl FromRequestParts for ApiVersion {
    fn from_request_parts(req: &Request) -> Result<Self> {
        req.extensions()
            .get::<ResolvedVersion>()
            .cloned()
            .map(ApiVersion)
            .ok_or_else(|| {
                ApiError::internal(format!(
                    "No API version resolved for {} {}. Is the route versioned?",
                    req.method(),
                    req.path()
                ))
            })
    }
}

impl Deref for ApiVersion {
    type Target = ResolvedVersion;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Makes any extractor optional: `None` instead of an error
impl<T: FromRequestParts> FromRequestParts for Option<T> {
    fn from_request_parts(req: &Request) -> Result<Self> {
        Ok(T::from_request_parts(req).ok())
    }
}
