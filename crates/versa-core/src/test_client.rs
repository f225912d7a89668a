//! TestClient for integration testing without network binding
//!
//! Requests go through the same routing and versioned dispatch as the real
//! server, without a socket.
//!
//! # Example
//!
//! ```rust,ignore
//! use versa_core::{TestClient, TestRequest, Versa, VersionedRoute};
//!
//! #[tokio::test]
//! async fn test_header_negotiation() {
//!     let app = Versa::new()
//!         .routev(VersionedRoute::get("/test", v1).version("v1"))
//!         .routev(VersionedRoute::get("/test", v2).version("v2").default());
//!     let client = TestClient::new(app);
//!
//!     client
//!         .request(TestRequest::get("/test").header("api-version", "v1"))
//!         .await
//!         .assert_status(200)
//!         .assert_header("version", "v1");
//! }
//! ```

use crate::app::Versa;
use crate::response::Response;
use crate::router::Router;
use crate::server::route_request;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};
use versa_versioning::VersioningError;

/// Test client for integration testing without network binding
pub struct TestClient {
    router: Router,
}

impl TestClient {
    /// Build `app` and wrap it
    ///
    /// # Panics
    ///
    /// Panics if the application fails to build.
    pub fn new(app: Versa) -> Self {
        match Self::try_new(app) {
            Ok(client) => client,
            Err(err) => panic!("Failed to build application: {}", err),
        }
    }

    /// Build `app` and wrap it, returning the build error instead of panicking
    pub fn try_new(app: Versa) -> Result<Self, VersioningError> {
        Ok(Self::from_router(app.build()?))
    }

    pub fn from_router(router: Router) -> Self {
        Self { router }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Send a request with full control
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let response = client.request(
    ///     TestRequest::get("/api/test")
    ///         .header("accept", "application/vnd.acme;version=v1")
    /// ).await;
    /// ```
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let uri: http::Uri = req.path.parse().unwrap_or_else(|_| http::Uri::from_static("/"));
        let mut builder = http::Request::builder().method(req.method).uri(uri);

        for (key, value) in req.headers.iter() {
            builder = builder.header(key, value);
        }

        let (parts, _) = builder.body(()).unwrap().into_parts();
        let response = route_request(&self.router, parts, req.body.unwrap_or_default()).await;
        TestResponse::from_response(response).await
    }

    /// Follow a redirect response with a GET to its `Location`
    ///
    /// Headers of `original` are sent again, the way a browser would.
    pub async fn follow(&self, response: &TestResponse, original: TestRequest) -> TestResponse {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_else(|| panic!("Response has no Location header: {:?}", response));

        let mut next = TestRequest::get(location);
        next.headers = original.headers;
        self.request(next).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header to the request; invalid names or values are ignored
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Set the request body as JSON
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body: body_bytes,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of a header, if present and visible ASCII
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert that the response has the expected status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert that the response has the expected header value
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self.header(key).unwrap_or("");

        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert that the response does not carry a header
    ///
    /// # Panics
    ///
    /// Panics if the header is present.
    pub fn assert_no_header(&self, key: &str) -> &Self {
        assert!(
            self.headers.get(key).is_none(),
            "Expected no header '{}', got '{:?}'",
            key,
            self.headers.get(key)
        );
        self
    }

    /// Assert that the body equals `expected`
    pub fn assert_text(&self, expected: &str) -> &Self {
        assert_eq!(self.text(), expected, "Body mismatch");
        self
    }
}
