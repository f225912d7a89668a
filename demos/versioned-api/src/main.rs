//! Versioned API demo
//!
//! Run with: cargo run -p versioned-api
//!
//! Then try:
//!
//! ```text
//! curl -i http://127.0.0.1:8080/users/7
//! curl -i http://127.0.0.1:8080/v1/users/7
//! curl -i -H 'api-version: v1' http://127.0.0.1:8080/users/7
//! curl -i -H 'accept: application/vnd.acme+json;version=v1' http://127.0.0.1:8080/users/7
//! ```
//!
//! Options come from `VERSA_*` variables or a `.env` file, e.g.
//! `VERSA_PREFIX=/api VERSA_REDIRECT=true`.

use versa::prelude::*;

#[derive(Serialize)]
struct UserV1 {
    id: i64,
    name: String,
}

#[derive(Serialize)]
struct UserV2 {
    id: i64,
    first_name: String,
    last_name: String,
    served_by: String,
}

async fn root() -> &'static str {
    "versioned-api"
}

async fn health() -> &'static str {
    "OK"
}

async fn get_user_v1(Path(id): Path<i64>) -> Json<UserV1> {
    Json(UserV1 {
        id,
        name: format!("User {}", id),
    })
}

async fn get_user_v2(version: ApiVersion, Path(id): Path<i64>) -> Json<UserV2> {
    debug!(source = %version.source(), "serving user {}", id);
    Json(UserV2 {
        id,
        first_name: "User".to_string(),
        last_name: id.to_string(),
        served_by: version.as_str().to_string(),
    })
}

async fn status() -> &'static str {
    "status"
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = versa::config::versioning_from_env()?;

    Versa::new()
        .versioning(config)
        .route("/health", get(health))
        .routev(VersionedRoute::get("/", root).version("v1").default())
        .routev(VersionedRoute::get("/users/{id}", get_user_v1).version("v1"))
        .routev(
            VersionedRoute::get("/users/{id}", get_user_v2)
                .version("v2")
                .default(),
        )
        .routev_batch([
            VersionedRoute::get("/status", status).boxed(),
            VersionedRoute::get("/status", status).version("v2").boxed(),
        ])
        .run("127.0.0.1:8080")
        .await
}
