//! Authentication middleware for the REST API
//!
//! When `ApiConfig::api_key` is set, every request except `GET /health`
//! must carry the key, either as `X-Api-Key: <key>` or as
//! `Authorization: Bearer <key>`.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Paths reachable without a key, so probes keep working
const PUBLIC_PATHS: &[&str] = &["/health"];

/// Reject requests that do not present the configured API key
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use stream_notifier::api::auth::require_api_key;
///
/// let api_key = Some("secret-key-123".to_string());
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(api_key, require_api_key));
/// ```
pub async fn require_api_key(
    State(expected_api_key): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_key) = expected_api_key else {
        return next.run(request).await;
    };

    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    match presented_key(&request) {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected_key.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing X-Api-Key header or bearer token"),
    }
}

fn presented_key(request: &Request) -> Option<&str> {
    let headers = request.headers();

    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Compares every byte so timing does not reveal the mismatch position
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn unauthorized_response(message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": "unauthorized",
            "message": message
        }
    }));

    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use tower::ServiceExt;

    fn app(api_key: Option<&str>) -> Router {
        Router::new()
            .route("/watchlist", get(|| async { "items" }))
            .route("/health", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                api_key.map(str::to_string),
                require_api_key,
            ))
    }

    async fn status(app: Router, request: Request<Body>) -> StatusCode {
        app.oneshot(request).await.unwrap().status()
    }

    fn get_request(uri: &str) -> axum::http::request::Builder {
        Request::builder().uri(uri)
    }

    #[tokio::test]
    async fn no_key_configured_lets_everything_through() {
        let request = get_request("/watchlist").body(Body::empty()).unwrap();
        assert_eq!(status(app(None), request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn matching_header_is_accepted() {
        let request = get_request("/watchlist")
            .header("x-api-key", "s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app(Some("s3cret")), request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let request = get_request("/watchlist")
            .header("Authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status(app(Some("s3cret")), request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_key_is_rejected_with_json_body() {
        let request = get_request("/watchlist")
            .header("X-Api-Key", "S3CRET")
            .body(Body::empty())
            .unwrap();
        let response = app(Some("s3cret")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "unauthorized");
        assert_eq!(json["error"]["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn missing_key_is_rejected() {
        let request = get_request("/watchlist").body(Body::empty()).unwrap();
        assert_eq!(
            status(app(Some("s3cret")), request).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn health_needs_no_key() {
        let request = get_request("/health").body(Body::empty()).unwrap();
        assert_eq!(status(app(Some("s3cret")), request).await, StatusCode::OK);
    }

    #[test]
    fn constant_time_eq_compares_exactly() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abc "));
    }
}
