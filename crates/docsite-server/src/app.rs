//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/versions", get(handlers::versions::get_versions))
        .route("/api/docs/{version}/tree", get(handlers::docs::get_tree))
        .route("/api/docs/{version}/pages", get(handlers::docs::get_root_page))
        .route("/api/docs/{version}/pages/{*path}", get(handlers::docs::get_page))
        .route("/api/feedback", post(handlers::feedback::post_feedback));

    Router::new()
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::csp_layer())
                .layer(security::content_type_options_layer())
                .layer(security::frame_options_layer()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use docsite_renderer::Compiler;
    use docsite_storage::{MockStorage, StorageErrorKind};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::VersionInfo;
    use crate::content::Content;
    use crate::feedback::{Feedback, FeedbackSink};
    use crate::rate_limit::RateLimiter;

    #[derive(Default)]
    struct RecordingSink {
        received: std::sync::Mutex<Vec<Feedback>>,
    }

    impl FeedbackSink for RecordingSink {
        fn submit(&self, feedback: &Feedback) -> Result<(), String> {
            self.received.lock().unwrap().push(feedback.clone());
            Ok(())
        }
    }

    fn storage() -> MockStorage {
        MockStorage::new()
            .with_file(
                "docs/8.1/get-started/index.mdx",
                "---\ntitle: Get started\norder: 1\n---\n\n## Setup\n\nText\n",
            )
            .with_file(
                "docs/8.1/get-started/install.mdx",
                "---\ntitle: Install\nparent: get-started/index\n---\n\nInstall it\n",
            )
            .with_file("docs/8.1/faq.md", "---\ntitle: FAQ\norder: 2\n---\n")
            .with_file("docs/8.1/broken.mdx", "<Marquee />\n")
            .with_file("docs/8.1/index.mdx", "---\ntitle: Home\n---\n")
            .with_failure("docs/8.1/offline.mdx", StorageErrorKind::Unavailable)
    }

    fn state_with(storage: MockStorage, sink: Arc<dyn FeedbackSink>) -> Arc<AppState> {
        let storage = Arc::new(storage);
        let content = Content::new(
            Arc::clone(&storage) as Arc<dyn docsite_storage::ContentSource>,
            storage,
            Compiler::default(),
            "docs",
            1,
        )
        .unwrap();

        Arc::new(AppState {
            resolver: content.resolver,
            tree: content.tree,
            versions: vec![
                VersionInfo {
                    id: "8.1".to_owned(),
                    label: "8.1".to_owned(),
                },
                VersionInfo {
                    id: "7.6".to_owned(),
                    label: "7.6".to_owned(),
                },
            ],
            default_version: Some("8.1".to_owned()),
            limiter: RateLimiter::new(Duration::from_secs(60), 100),
            feedback: sink,
        })
    }

    fn router() -> Router {
        create_router(state_with(storage(), Arc::new(RecordingSink::default())))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn feedback_request(body: &Value, ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/feedback")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-real-ip", ip)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn valid_feedback() -> Value {
        json!({
            "slug": "/docs/get-started",
            "feedback": "Helpful",
            "reaction": "up",
            "renderer": "react",
            "language": "ts",
            "version": "8.1"
        })
    }

    #[tokio::test]
    async fn test_versions() {
        let (status, _, body) = send(router(), get("/api/versions")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default"], "8.1");
        assert_eq!(body["versions"][1]["id"], "7.6");
    }

    #[tokio::test]
    async fn test_tree() {
        let (status, _, body) = send(router(), get("/api/docs/8.1/tree")).await;

        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Get started", "FAQ", "Broken"]);
        assert_eq!(items[0]["children"][0]["title"], "Install");
        assert_eq!(items[0]["children"][0]["level"], 2);
        assert_eq!(body["dropped"][0]["id"], "docs/8.1/index");
        assert_eq!(body["dropped"][0]["reason"]["kind"], "unsupported_shape");
    }

    #[tokio::test]
    async fn test_tree_unknown_version() {
        let (status, _, body) = send(router(), get("/api/docs/1.0/tree")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["version"], "1.0");
    }

    #[tokio::test]
    async fn test_page() {
        let (status, headers, body) =
            send(router(), get("/api/docs/8.1/pages/get-started/install")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["title"], "Install");
        assert_eq!(body["meta"]["slug"], "install");
        assert!(body["content"].as_str().unwrap().contains("Install it"));
        assert!(headers.contains_key(header::ETAG));
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_page_index_and_markdown_fallbacks() {
        let (status, _, body) = send(router(), get("/api/docs/8.1/pages/get-started")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["slug"], "get-started");
        assert_eq!(body["toc"][0]["id"], "setup");

        let (status, _, body) = send(router(), get("/api/docs/8.1/pages/faq")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["name"], "faq.md");

        let (status, _, body) = send(router(), get("/api/docs/8.1/pages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["title"], "Home");
    }

    #[tokio::test]
    async fn test_page_not_modified() {
        let (_, headers, _) = send(router(), get("/api/docs/8.1/pages/faq")).await;
        let etag = headers[header::ETAG].clone();

        let request = Request::builder()
            .uri("/api/docs/8.1/pages/faq")
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(router(), request).await;

        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_page_frontmatter_edit_changes_etag() {
        let served = |title: &str| {
            let storage = MockStorage::new()
                .with_file("docs/8.1/faq.mdx", format!("---\ntitle: {title}\n---\n\nSame body\n"));
            create_router(state_with(storage, Arc::new(RecordingSink::default())))
        };

        let (_, headers, _) = send(served("Old title"), get("/api/docs/8.1/pages/faq")).await;
        let etag = headers[header::ETAG].clone();

        let request = Request::builder()
            .uri("/api/docs/8.1/pages/faq")
            .header(header::IF_NONE_MATCH, etag.clone())
            .body(Body::empty())
            .unwrap();
        let (status, headers, body) = send(served("New title"), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_ne!(headers[header::ETAG], etag);
        assert_eq!(body["meta"]["title"], "New title");
    }

    #[tokio::test]
    async fn test_page_not_modified_weak_validator_list() {
        let (_, headers, _) = send(router(), get("/api/docs/8.1/pages/faq")).await;
        let etag = headers[header::ETAG].to_str().unwrap().to_owned();

        let request = Request::builder()
            .uri("/api/docs/8.1/pages/faq")
            .header(header::IF_NONE_MATCH, format!("\"stale\", W/{etag}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(router(), request).await;

        assert_eq!(status, StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_page_not_found() {
        let (status, _, body) = send(router(), get("/api/docs/8.1/pages/missing")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["path"], "missing");
    }

    #[tokio::test]
    async fn test_page_traversal_is_not_found() {
        let (status, _, _) = send(router(), get("/api/docs/8.1/pages/a/../../secret")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_page_compile_failure() {
        let (status, _, body) = send(router(), get("/api/docs/8.1/pages/broken")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("broken.mdx"));
    }

    #[tokio::test]
    async fn test_page_transport_failure() {
        let (status, _, _) = send(router(), get("/api/docs/8.1/pages/offline")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_feedback_accepted() {
        let sink = Arc::new(RecordingSink::default());
        let router = create_router(state_with(storage(), Arc::clone(&sink) as Arc<dyn FeedbackSink>));

        let (status, _, body) = send(router, feedback_request(&valid_feedback(), "10.0.0.1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "ok"}));
        let received = sink.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].slug, "/docs/get-started");
    }

    #[tokio::test]
    async fn test_feedback_invalid() {
        let mut empty = valid_feedback();
        empty["feedback"] = json!("  ");
        let mut reaction = valid_feedback();
        reaction["reaction"] = json!("sideways");
        let mut version = valid_feedback();
        version["version"] = json!("1.0");

        for body in [empty, reaction, version, json!({"slug": "/docs"})] {
            let (status, _, response) = send(router(), feedback_request(&body, "10.0.0.1")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response, json!({"message": "fail"}));
        }
    }

    #[tokio::test]
    async fn test_feedback_rate_limited() {
        let router = router();

        let (first, _, _) =
            send(router.clone(), feedback_request(&valid_feedback(), "10.0.0.1")).await;
        let (second, _, _) =
            send(router.clone(), feedback_request(&valid_feedback(), "10.0.0.1")).await;
        let (other, _, _) = send(router, feedback_request(&valid_feedback(), "10.0.0.2")).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(other, StatusCode::OK);
    }
}
