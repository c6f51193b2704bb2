use reqwest::multipart::{Form, Part};

use crate::common::{TestApp, file_part, ids_of, png_bytes, routes};

mod submission {
    use super::*;

    #[tokio::test]
    async fn public_submission_starts_pending_with_no_views() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("title", "Sunset")
            .text("description", "")
            .part("submission-file", file_part("a.png", png_bytes("sunset")));

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Work submitted successfully!");
        let work = &res.body["work"];
        assert_eq!(work["title"], "Sunset");
        assert!(work["description"].is_null());
        assert_eq!(work["status"], "pending");
        assert_eq!(work["views"], 0);
        assert_eq!(work["imageSource"], "file");
        assert!(work.get("addedBy").is_none());
        assert!(work["submittedAt"].is_string());

        let image_url = work["imageUrl"].as_str().unwrap();
        assert!(image_url.starts_with("/uploads/"));
        assert!(image_url.ends_with(".png"));
    }

    #[tokio::test]
    async fn text_fields_are_stored_verbatim() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("title", "  Sunset  ")
            .text("description", "\tover the bay\n")
            .text("image-url", "https://example.com/s.png");

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["work"]["title"], "  Sunset  ");
        assert_eq!(res.body["work"]["description"], "\tover the bay\n");
    }

    #[tokio::test]
    async fn submission_ids_are_unique() {
        let app = TestApp::spawn().await;

        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(app.submit_url(&format!("Work {i}"), "https://example.com/a.png").await);
        }

        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[tokio::test]
    async fn image_url_is_accepted_instead_of_a_file() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("title", "Remote")
            .text("image-url", "https://example.com/remote.jpg");

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["work"]["imageUrl"], "https://example.com/remote.jpg");
        assert_eq!(res.body["work"]["imageSource"], "url");
        assert_eq!(res.body["work"]["status"], "pending");
    }

    #[tokio::test]
    async fn uploaded_file_wins_over_image_url() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("image-url", "https://example.com/ignored.jpg")
            .part("submission-file", file_part("b.png", png_bytes("both")));

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["work"]["imageSource"], "file");
        assert!(
            res.body["work"]["imageUrl"]
                .as_str()
                .unwrap()
                .starts_with("/uploads/")
        );
    }

    #[tokio::test]
    async fn submission_without_an_image_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new().text("title", "Nothing to see");

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "File not uploaded.");
        assert!(app.public_ids().await.is_empty());
    }

    #[tokio::test]
    async fn empty_file_field_counts_as_no_image() {
        let app = TestApp::spawn().await;
        let empty = Part::bytes(Vec::new()).file_name("");
        let form = Form::new()
            .text("title", "Blank input")
            .part("submission-file", empty);

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "File not uploaded.");
        assert_eq!(app.stored_blob_count(), 0);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn_with(crate::common::TestOptions {
            max_blob_size: 16,
            ..Default::default()
        })
        .await;
        let form = Form::new().part("submission-file", file_part("big.png", vec![7u8; 64]));

        let res = app.post_form(routes::SUBMIT, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.stored_blob_count(), 0);
    }
}

mod admin_add {
    use super::*;

    #[tokio::test]
    async fn admin_added_work_is_approved_with_defaults() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("image-type", "file")
            .part("submission-file", file_part("c.png", png_bytes("admin")));

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Content added successfully!");
        let work = &res.body["work"];
        assert_eq!(work["status"], "approved");
        assert_eq!(work["addedBy"], "admin");
        assert_eq!(work["title"], "Untitled");
        assert_eq!(work["description"], "No description");
        assert_eq!(work["imageSource"], "file");
        assert_eq!(work["views"], 0);

        let id = res.work_id();
        assert_eq!(app.public_ids().await, vec![id]);
    }

    #[tokio::test]
    async fn admin_can_add_by_url() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("title", "Linked")
            .text("description", "Hosted elsewhere")
            .text("image-type", "url")
            .text("image-url", "https://example.com/linked.webp");

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["work"]["title"], "Linked");
        assert_eq!(res.body["work"]["description"], "Hosted elsewhere");
        assert_eq!(res.body["work"]["imageSource"], "url");
        assert_eq!(res.body["work"]["imageUrl"], "https://example.com/linked.webp");
    }

    #[tokio::test]
    async fn file_mode_without_a_file_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("image-type", "file")
            .text("image-url", "https://example.com/x.png");

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "File not uploaded.");
    }

    #[tokio::test]
    async fn url_mode_without_a_url_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new().text("image-type", "url");

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_image_type_is_rejected() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("image-type", "canvas")
            .text("image-url", "https://example.com/x.png");

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("canvas"));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_storage() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("image-type", "canvas")
            .part("submission-file", file_part("c.png", png_bytes("canvas")));

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.stored_blob_count(), 0);
        assert!(app.get_as_admin(routes::WORKS).await.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unused_upload_is_not_kept_when_url_mode_wins() {
        let app = TestApp::spawn().await;
        let form = Form::new()
            .text("image-type", "url")
            .text("image-url", "https://example.com/x.png")
            .part("submission-file", file_part("d.png", png_bytes("unused")));

        let res = app.post_form_as_admin(routes::ADMIN_ADD, form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["work"]["imageSource"], "url");
        assert_eq!(app.stored_blob_count(), 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn admin_listing_returns_every_work_newest_first() {
        let app = TestApp::spawn().await;
        let first = app.submit_url("First", "https://example.com/1.png").await;
        let second = app.submit_url("Second", "https://example.com/2.png").await;
        let third = app.submit_url("Third", "https://example.com/3.png").await;
        assert_eq!(app.set_status(second, "rejected").await.status, 200);

        let res = app.get_as_admin(routes::WORKS).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(ids_of(&res.body), vec![third, second, first]);
    }

    #[tokio::test]
    async fn listing_is_ordered_by_submission_time() {
        let app = TestApp::spawn().await;
        let mut expected = Vec::new();
        for i in 0..5 {
            expected.push(app.submit_url(&format!("W{i}"), "https://example.com/w.png").await);
            tokio::time::sleep(std::time::Duration::from_millis(3)).await;
        }
        expected.reverse();

        let res = app.get_as_admin(routes::WORKS).await;
        let works = res.body.as_array().unwrap();

        assert_eq!(ids_of(&res.body), expected);
        let times: Vec<chrono::DateTime<chrono::FixedOffset>> = works
            .iter()
            .map(|w| {
                let raw = w["submittedAt"].as_str().unwrap();
                chrono::DateTime::parse_from_rfc3339(raw).unwrap()
            })
            .collect();
        assert!(times.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[tokio::test]
    async fn public_listing_only_shows_approved_works() {
        let app = TestApp::spawn().await;
        let pending = app.submit_url("Pending", "https://example.com/p.png").await;
        let approved = app.submit_url("Approved", "https://example.com/a.png").await;
        let rejected = app.submit_url("Rejected", "https://example.com/r.png").await;
        app.set_status(approved, "approved").await;
        app.set_status(rejected, "rejected").await;

        let res = app.get(routes::WORKS_PUBLIC).await;

        assert_eq!(res.status, 200);
        assert_eq!(ids_of(&res.body), vec![approved]);
        for work in res.body.as_array().unwrap() {
            assert_eq!(work["status"], "approved");
        }
        assert!(!ids_of(&res.body).contains(&pending));
    }

    #[tokio::test]
    async fn empty_gallery_is_an_empty_list() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::WORKS_PUBLIC).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::HEALTH).await;

        assert_eq!(res.status, 200);
    }
}
