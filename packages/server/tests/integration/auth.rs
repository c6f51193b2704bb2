use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{ADMIN_USER, TestApp, TestOptions, TestResponse, routes};

async fn send(request: reqwest::RequestBuilder) -> TestResponse {
    TestResponse::from_response(request.send().await.expect("request failed")).await
}

#[tokio::test]
async fn admin_routes_require_credentials() {
    let app = TestApp::spawn().await;
    let id = app.submit_url("Guarded", "https://example.com/g.png").await;

    let attempts = [
        app.client.get(app.url(routes::WORKS)),
        app.client.delete(app.url(&routes::work(id))),
        app.client
            .post(app.url(&routes::status(id)))
            .json(&json!({"status": "approved"})),
        app.client
            .post(app.url(&routes::status_by_query(id)))
            .json(&json!({"status": "approved"})),
        app.client
            .post(app.url(routes::ADMIN_ADD))
            .multipart(Form::new().text("image-url", "https://example.com/x.png")),
    ];

    for request in attempts {
        let res = request.send().await.expect("request failed");
        assert_eq!(res.status(), 401);
        assert_eq!(
            res.headers()["www-authenticate"],
            "Basic realm=\"Admin Panel\""
        );
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    // Nothing changed.
    assert!(app.public_ids().await.is_empty());
    assert_eq!(app.get(&routes::views(id)).await.status, 200);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;

    let res = send(
        app.client
            .get(app.url(routes::WORKS))
            .basic_auth(ADMIN_USER, Some("guess")),
    )
    .await;
    assert_eq!(res.status, 401);

    let res = send(
        app.client
            .get(app.url(routes::WORKS))
            .basic_auth("someone-else", Some(crate::common::ADMIN_PASSWORD)),
    )
    .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn bearer_tokens_are_not_basic_credentials() {
    let app = TestApp::spawn().await;

    let res = send(
        app.client
            .get(app.url(routes::WORKS))
            .header("Authorization", "Bearer abc.def.ghi"),
    )
    .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn unconfigured_admin_is_a_server_error() {
    let app = TestApp::spawn_with(TestOptions {
        admin: false,
        ..Default::default()
    })
    .await;

    let res = app.get_as_admin(routes::WORKS).await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "NOT_CONFIGURED");
}

#[tokio::test]
async fn public_routes_need_no_credentials() {
    let app = TestApp::spawn_with(TestOptions {
        admin: false,
        ..Default::default()
    })
    .await;

    let id = app.submit_url("Open", "https://example.com/o.png").await;
    assert_eq!(app.get(routes::WORKS_PUBLIC).await.status, 200);
    assert_eq!(app.post(&routes::view(id)).await.status, 200);
    assert_eq!(app.get(&routes::views(id)).await.status, 200);
}
