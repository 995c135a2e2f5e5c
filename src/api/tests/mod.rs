use super::*;
use crate::test_helpers::{RecordingSink, ScriptedProvider, create_test_notifier};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

mod checks;

struct TestApp {
    router: Router,
    notifier: Arc<StreamNotifier>,
    provider: Arc<ScriptedProvider>,
    sink: Arc<RecordingSink>,
    _dir: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let (notifier, provider, sink, dir) = create_test_notifier().await;
        let mut config = (*notifier.get_config()).clone();
        adjust(&mut config);

        let notifier = Arc::new(notifier);
        let router = create_router(notifier.clone(), Arc::new(config));
        Self {
            router,
            notifier,
            provider,
            sink,
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str) -> Response {
        self.send(Request::delete(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_empty(&self, uri: &str) -> Response {
        self.send(Request::post(uri).body(Body::empty()).unwrap()).await
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn api_server_binds_and_stops_on_cancel() {
    let (notifier, _provider, _sink, _dir) = create_test_notifier().await;
    let mut config = (*notifier.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();

    let token = CancellationToken::new();
    let server = tokio::spawn(start_api_server(
        Arc::new(notifier),
        Arc::new(config),
        token.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after cancellation")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn cors_headers_are_added_for_any_origin() {
    let app = TestApp::new().await;

    let request = Request::get("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn cors_respects_origin_list() {
    let app = TestApp::with_config(|c| {
        c.server.api.cors_origins = vec!["http://app.example.com".to_string()];
    })
    .await;

    let allowed = Request::get("/health")
        .header("Origin", "http://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.send(allowed).await;
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://app.example.com"
    );

    let other = Request::get("/health")
        .header("Origin", "http://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.send(other).await;
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn api_key_guards_everything_but_health() {
    let app = TestApp::with_config(|c| {
        c.server.api.api_key = Some("s3cret".to_string());
    })
    .await;

    assert_eq!(app.get("/watchlist").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);

    let request = Request::get("/watchlist")
        .header("X-Api-Key", "s3cret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}
