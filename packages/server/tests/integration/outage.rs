use reqwest::multipart::Form;

use crate::common::{TestApp, TestOptions, routes};

async fn spawn_without_database() -> TestApp {
    TestApp::spawn_with(TestOptions {
        database: false,
        ..Default::default()
    })
    .await
}

#[tokio::test]
async fn public_listing_degrades_to_an_empty_gallery() {
    let app = spawn_without_database().await;

    let res = app.get(routes::WORKS_PUBLIC).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, serde_json::json!([]));
}

#[tokio::test]
async fn admin_listing_reports_the_failure() {
    let app = spawn_without_database().await;

    let res = app.get_as_admin(routes::WORKS).await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn writes_and_counters_fail_with_500() {
    let app = spawn_without_database().await;
    let form = Form::new()
        .text("title", "Offline")
        .text("image-url", "https://example.com/o.png");

    let submitted = app.post_form(routes::SUBMIT, form).await;
    assert_eq!(submitted.status, 500);
    assert_eq!(submitted.body["code"], "INTERNAL_ERROR");

    assert_eq!(app.post(&routes::view(1)).await.status, 500);
    assert_eq!(app.get(&routes::views(1)).await.status, 500);
    assert_eq!(app.set_status(1, "approved").await.status, 500);
    assert_eq!(app.get(routes::HEALTH).await.status, 200);
}
