//! HTTP server implementation

use crate::error::ApiError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{RouteMatch, Router};
use bytes::Bytes;
use http::{header, request::Parts, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Internal server struct
pub(crate) struct Server {
    router: Arc<Router>,
}

impl Server {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Accept connections until the listener fails
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        info!("versa server running on http://{}", addr);

        loop {
            let (stream, _remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let router = router.clone();
                    async move { Ok::<_, Infallible>(handle_request(router, req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Buffer the body, route, and log a single HTTP request
async fn handle_request(router: Arc<Router>, req: hyper::Request<Incoming>) -> Response {
    let start = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let response = match body.collect().await {
        Ok(collected) => route_request(&router, parts, collected.to_bytes()).await,
        Err(err) => ApiError::bad_request("Failed to read request body")
            .with_internal(err.to_string())
            .into_response(),
    };

    log_request(&method, &path, response.status(), start);
    response
}

/// Route an already-buffered request through `router`
pub(crate) async fn route_request(router: &Router, parts: Parts, body: Bytes) -> Response {
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    match router.match_route(&path, &method) {
        RouteMatch::Found { handler, params } => {
            let handler = handler.clone();
            handler(Request::new(parts, body, params)).await
        }
        RouteMatch::NotFound => {
            ApiError::not_found(format!("No route found for {} {}", method, path)).into_response()
        }
        RouteMatch::MethodNotAllowed { allowed } => {
            let mut response =
                ApiError::method_not_allowed(format!("Method {} not allowed for {}", method, path))
                    .into_response();
            let allowed_str: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            if let Ok(value) = HeaderValue::from_str(&allowed_str.join(", ")) {
                response.headers_mut().insert(header::ALLOW, value);
            }
            response
        }
    }
}

/// Log request completion
fn log_request(method: &Method, path: &str, status: StatusCode, start: Instant) {
    let elapsed = start.elapsed();

    if status.is_success() || status.is_redirection() {
        info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    }
}
