//! End-to-end negotiation through the in-process TestClient

use versa::prelude::*;
use versa::{TestClient, TestRequest};

async fn root_v1() -> &'static str {
    "root 1"
}

async fn test_v1() -> &'static str {
    "version 1"
}

async fn test_v2() -> &'static str {
    "version 2"
}

async fn test_v3() -> &'static str {
    "version 3"
}

async fn regular() -> &'static str {
    "regular"
}

async fn generic() -> &'static str {
    "generic"
}

fn app(config: VersioningConfig) -> TestClient {
    let app = Versa::new()
        .versioning(config)
        .routev(VersionedRoute::get("/", root_v1).version("v1").default())
        .routev(VersionedRoute::get("/test", test_v1).version("v1"))
        .routev(VersionedRoute::get("/test", test_v2).version("v2").default())
        .routev(VersionedRoute::get("/test", test_v3).version("v3"))
        .route("/regular", get(regular))
        .routev_batch([
            VersionedRoute::get("/generic", generic).boxed(),
            VersionedRoute::get("/generic", generic).version("v2").boxed(),
        ]);

    TestClient::new(app)
}

fn redirecting() -> TestClient {
    app(VersioningConfig::default().prefix("/api").redirect(true))
}

const ACCEPT_V1: &str = "vnd.walmart.foo;version=v1;blah=bar;";

mod default_options {
    use super::*;

    #[tokio::test]
    async fn batch_routes_get_untagged_default_label() {
        let client = app(VersioningConfig::default());

        client
            .get("/v1/generic")
            .await
            .assert_status(200)
            .assert_text("generic")
            .assert_header("version", "v1");

        client
            .get("/v2/generic")
            .await
            .assert_status(200)
            .assert_text("generic")
            .assert_header("version", "v2");

        client
            .get("/generic")
            .await
            .assert_status(200)
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn regular_route_has_no_version_header() {
        app(VersioningConfig::default())
            .get("/regular")
            .await
            .assert_status(200)
            .assert_text("regular")
            .assert_no_header("version");
    }

    #[tokio::test]
    async fn custom_header_selects_version() {
        app(VersioningConfig::default())
            .request(TestRequest::get("/test").header("api-version", "v1"))
            .await
            .assert_status(200)
            .assert_text("version 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn accept_header_selects_version() {
        app(VersioningConfig::default())
            .request(TestRequest::get("/test").header("accept", ACCEPT_V1))
            .await
            .assert_status(200)
            .assert_text("version 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn custom_header_beats_accept() {
        app(VersioningConfig::default())
            .request(
                TestRequest::get("/test")
                    .header("accept", ACCEPT_V1)
                    .header("api-version", "v3"),
            )
            .await
            .assert_status(200)
            .assert_text("version 3")
            .assert_header("version", "v3");
    }

    #[tokio::test]
    async fn uri_versions() {
        let client = app(VersioningConfig::default());

        for (path, text, version) in [
            ("/v1/test", "version 1", "v1"),
            ("/v2/test", "version 2", "v2"),
            ("/v3/test", "version 3", "v3"),
        ] {
            client
                .get(path)
                .await
                .assert_status(200)
                .assert_text(text)
                .assert_header("version", version);
        }
    }

    #[tokio::test]
    async fn uri_version_beats_headers() {
        app(VersioningConfig::default())
            .request(
                TestRequest::get("/v1/test")
                    .header("api-version", "v3")
                    .header("accept", "vnd.walmart.foo;version=v2"),
            )
            .await
            .assert_text("version 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn root_paths() {
        let client = app(VersioningConfig::default());

        client
            .get("/")
            .await
            .assert_text("root 1")
            .assert_header("version", "v1");

        client
            .get("/v1")
            .await
            .assert_text("root 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn unversioned_path_serves_default() {
        app(VersioningConfig::default())
            .get("/test")
            .await
            .assert_status(200)
            .assert_text("version 2")
            .assert_header("version", "v2");
    }

    #[tokio::test]
    async fn unknown_header_version_is_not_found() {
        let response = app(VersioningConfig::default())
            .request(TestRequest::get("/test").header("api-version", "v9"))
            .await;

        response.assert_status(404).assert_header("version", "v9");
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"]["type"], "not_found");
    }

    #[tokio::test]
    async fn unknown_uri_version_is_not_routed() {
        app(VersioningConfig::default())
            .get("/v9/test")
            .await
            .assert_status(404)
            .assert_no_header("version");
    }

    #[tokio::test]
    async fn versioned_route_rejects_other_methods() {
        let response = app(VersioningConfig::default())
            .request(TestRequest::post("/test"))
            .await;

        response.assert_status(405).assert_header("allow", "GET");
    }

    #[tokio::test]
    async fn no_redirect_without_redirect_mode() {
        app(VersioningConfig::default())
            .request(TestRequest::get("/test").header("api-version", "v3"))
            .await
            .assert_status(200)
            .assert_no_header("location");
    }
}

mod other_options {
    use super::*;

    #[tokio::test]
    async fn custom_header_redirects_then_serves() {
        let client = redirecting();
        let request = TestRequest::get("/api/test").header("api-version", "v1");

        let redirect = client.request(request.clone()).await;
        redirect
            .assert_status(302)
            .assert_header("location", "/api/v1/test")
            .assert_header("version", "v1");

        client
            .follow(&redirect, request)
            .await
            .assert_status(200)
            .assert_text("version 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn accept_without_version_does_not_bail() {
        redirecting()
            .request(TestRequest::get("/api/test").header("accept", "vnd.walmart.foo;;blah=bar;"))
            .await
            .assert_status(200)
            .assert_text("version 2")
            .assert_header("version", "v2");
    }

    #[tokio::test]
    async fn accept_header_redirects_then_serves() {
        let client = redirecting();
        let request = TestRequest::get("/api/test").header("accept", ACCEPT_V1);

        let redirect = client.request(request.clone()).await;
        redirect.assert_status(302);

        client
            .follow(&redirect, request)
            .await
            .assert_status(200)
            .assert_text("version 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn default_version_is_served_in_place() {
        redirecting()
            .request(TestRequest::get("/api/test").header("api-version", "v2"))
            .await
            .assert_status(200)
            .assert_text("version 2")
            .assert_no_header("location");
    }

    #[tokio::test]
    async fn redirect_keeps_query_string() {
        redirecting()
            .request(TestRequest::get("/api/test?page=2&sort=asc").header("api-version", "v3"))
            .await
            .assert_status(302)
            .assert_header("location", "/api/v3/test?page=2&sort=asc");
    }

    #[tokio::test]
    async fn unknown_version_is_not_redirected() {
        redirecting()
            .request(TestRequest::get("/api/test").header("api-version", "v9"))
            .await
            .assert_status(404)
            .assert_no_header("location");
    }

    #[tokio::test]
    async fn uri_versions_under_prefix() {
        let client = redirecting();

        client
            .get("/api/v1/test")
            .await
            .assert_status(200)
            .assert_text("version 1")
            .assert_header("version", "v1");

        client
            .get("/api/v3/test")
            .await
            .assert_status(200)
            .assert_text("version 3");
    }

    #[tokio::test]
    async fn prefixed_root_paths() {
        let client = redirecting();

        client
            .get("/api")
            .await
            .assert_status(200)
            .assert_text("root 1")
            .assert_header("version", "v1");

        client
            .get("/api/v1")
            .await
            .assert_status(200)
            .assert_text("root 1")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn prefixed_default() {
        redirecting()
            .get("/api/test")
            .await
            .assert_status(200)
            .assert_text("version 2")
            .assert_header("version", "v2");
    }

    #[tokio::test]
    async fn plain_routes_ignore_prefix() {
        let client = redirecting();

        client.get("/regular").await.assert_status(200);
        client.get("/test").await.assert_status(404);
    }
}

mod custom_headers {
    use super::*;

    #[tokio::test]
    async fn renamed_request_and_response_headers() {
        let client = app(
            VersioningConfig::default()
                .header("x-api-version")
                .response_header("x-served-version"),
        );

        client
            .request(
                TestRequest::get("/test")
                    .header("x-api-version", "v3")
                    .header("api-version", "v1"),
            )
            .await
            .assert_text("version 3")
            .assert_header("x-served-version", "v3")
            .assert_no_header("version");
    }
}

mod extractor {
    use super::*;

    async fn whoami(version: ApiVersion) -> String {
        format!("{} from {}", version.as_str(), version.source())
    }

    #[tokio::test]
    async fn handler_sees_resolved_version() {
        let client = TestClient::new(
            Versa::new()
                .routev(VersionedRoute::get("/whoami", whoami).version("v1"))
                .routev(VersionedRoute::get("/whoami", whoami).version("v2").default()),
        );

        client.get("/v1/whoami").await.assert_text("v1 from path");
        client.get("/whoami").await.assert_text("v2 from default");
        client
            .request(TestRequest::get("/whoami").header("api-version", "v1"))
            .await
            .assert_text("v1 from header");
        client
            .request(TestRequest::get("/whoami").header("accept", "application/json;version=v1"))
            .await
            .assert_text("v1 from accept");
    }
}

mod path_parameters {
    use super::*;

    async fn greet_v1(Path(name): Path<String>) -> String {
        format!("v1 {}", name)
    }

    async fn greet_v2(Path(name): Path<String>) -> String {
        format!("v2 {}", name)
    }

    fn client() -> TestClient {
        TestClient::new(
            Versa::new()
                .routev(VersionedRoute::get("/{name}", greet_v1).version("v1").default())
                .routev(VersionedRoute::get("/{name}", greet_v2).version("v2")),
        )
    }

    #[tokio::test]
    async fn label_shaped_parameter_on_unversioned_path() {
        client()
            .get("/v2")
            .await
            .assert_status(200)
            .assert_text("v1 v2")
            .assert_header("version", "v1");
    }

    #[tokio::test]
    async fn versioned_path_binds_parameter_after_label() {
        client()
            .get("/v2/v1")
            .await
            .assert_status(200)
            .assert_text("v2 v1")
            .assert_header("version", "v2");
    }

    #[tokio::test]
    async fn header_still_negotiates_on_unversioned_path() {
        client()
            .request(TestRequest::get("/ada").header("api-version", "v2"))
            .await
            .assert_status(200)
            .assert_text("v2 ada");
    }
}
