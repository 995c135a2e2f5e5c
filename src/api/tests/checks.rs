use super::*;
use crate::catalog::ServiceId;
use crate::types::{MediaKind, NewItem};
use std::collections::BTreeSet;

async fn track_film(app: &TestApp, external_id: i64, title: &str) {
    app.notifier
        .add_item(NewItem {
            external_id,
            title: title.to_string(),
            media_kind: MediaKind::Film,
            providers: BTreeSet::new(),
            release_date: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn check_returns_the_pass_report() {
    let app = TestApp::new().await;
    app.provider.set_availability(603, &[ServiceId::Netflix, ServiceId::Bbc]);
    track_film(&app, 603, "The Matrix").await;

    let response = app.post_empty("/check").await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = json_body(response).await;
    assert_eq!(report["trigger"], "manual");
    assert_eq!(report["checked"], 1);
    let events = report["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["kind"], "now_available");
    assert_eq!(
        events[0]["notification"]["body"],
        "The Matrix is now available on Netflix, BBC iPlayer!"
    );
}

#[tokio::test]
async fn available_services_are_listed_in_catalog_order() {
    let app = TestApp::new().await;
    app.provider
        .set_availability(603, &[ServiceId::Paramount, ServiceId::Bbc, ServiceId::Netflix]);
    track_film(&app, 603, "The Matrix").await;

    let report = json_body(app.post_empty("/check").await).await;
    assert_eq!(
        report["events"][0]["notification"]["body"],
        "The Matrix is now available on Netflix, BBC iPlayer, Paramount+!"
    );
}

#[tokio::test]
async fn notifications_can_be_listed_dismissed_and_cleared() {
    let app = TestApp::new().await;
    app.provider.set_availability(603, &[ServiceId::Prime]);
    track_film(&app, 603, "The Matrix").await;
    app.post_empty("/check").await;

    let list = json_body(app.get("/notifications").await).await;
    let entries = list.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "Movie Now Available");
    let id = entries[0]["id"].as_i64().unwrap();

    let dismissed = app.post_empty(&format!("/notifications/{id}/dismiss")).await;
    assert_eq!(dismissed.status(), StatusCode::NO_CONTENT);

    let visible = json_body(app.get("/notifications").await).await;
    assert!(visible.as_array().unwrap().is_empty());
    let all = json_body(app.get("/notifications?include_dismissed=true").await).await;
    assert_eq!(all.as_array().unwrap().len(), 1);

    let cleared = json_body(app.delete("/notifications").await).await;
    assert_eq!(cleared["removed"], 1);
}

#[tokio::test]
async fn non_positive_limit_is_a_bad_request() {
    let app = TestApp::new().await;

    let response = app.get("/notifications?limit=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "validation_error");
}

#[tokio::test]
async fn check_after_shutdown_is_unavailable() {
    let app = TestApp::new().await;
    app.notifier.shutdown().await.unwrap();

    let response = app.post_empty("/check").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key("retry-after"));
}
