use reqwest::multipart::Form;

use crate::common::{TestApp, file_part, png_bytes, routes};

#[tokio::test]
async fn serial_views_are_all_counted() {
    let app = TestApp::spawn().await;
    let id = app.submit_url("Counted", "https://example.com/c.png").await;

    for expected in 1..=20 {
        let res = app.post(&routes::view(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "View recorded successfully!");
        assert_eq!(res.body["views"], expected);
        assert_eq!(res.body["workId"], id);
    }

    let res = app.get(&routes::views(id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["views"], 20);
    assert_eq!(res.body["workId"], id);
}

#[tokio::test]
async fn concurrent_views_are_not_lost() {
    let app = TestApp::spawn().await;
    let id = app.submit_url("Popular", "https://example.com/p.png").await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let client = app.client.clone();
        let url = app.url(&routes::view(id));
        tasks.spawn(async move { client.post(url).send().await.map(|r| r.status().as_u16()) });
    }
    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap().unwrap(), 200);
    }

    let res = app.get(&routes::views(id)).await;
    assert_eq!(res.body["views"], 16);
}

#[tokio::test]
async fn pending_works_can_still_be_viewed() {
    let app = TestApp::spawn().await;
    let id = app.submit_url("Unmoderated", "https://example.com/u.png").await;

    let res = app.post(&routes::view(id)).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["views"], 1);
}

#[tokio::test]
async fn unknown_work_has_no_view_count() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::views(12345)).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Work not found.");

    let res = app.post(&routes::view(12345)).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let app = TestApp::spawn().await;

    assert_eq!(app.get("/api/works/latest/views").await.status, 400);
    assert_eq!(app.post("/api/works/latest/view").await.status, 400);
}

/// Submit, approve, view twice, delete: the full lifecycle of one work.
#[tokio::test]
async fn sunset_lifecycle() {
    let app = TestApp::spawn().await;

    let form = Form::new()
        .text("title", "Sunset")
        .part("submission-file", file_part("a.png", png_bytes("sunset-lifecycle")));
    let res = app.post_form(routes::SUBMIT, form).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["work"]["status"], "pending");
    assert_eq!(res.body["work"]["views"], 0);
    let id = res.work_id();

    let res = app.set_status(id, "approved").await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get(routes::WORKS_PUBLIC).await;
    let listed = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["id"] == id)
        .expect("approved work should be public");
    assert_eq!(listed["title"], "Sunset");
    assert_eq!(listed["status"], "approved");

    let view_path = routes::view(id);
    let (first, second) = tokio::join!(app.post(&view_path), app.post(&view_path));
    assert_eq!(first.status, 200);
    assert_eq!(second.status, 200);
    assert_eq!(app.get(&routes::views(id)).await.body["views"], 2);

    assert_eq!(app.delete_as_admin(&routes::work(id)).await.status, 200);
    assert!(!app.public_ids().await.contains(&id));
    assert_eq!(app.get(&routes::views(id)).await.status, 404);
}
