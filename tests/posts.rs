mod common;

use axum::http::StatusCode;
use common::{body_json, location, setup, Part, SMALL_GIF};
use yatube::{
    db::{PostFilter, Repository},
    posts::models::{BLANK_POST_TEXT, INVALID_IMAGE, UNKNOWN_GROUP},
};

#[tokio::test]
async fn create_post_redirects_to_profile() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let group = app.group("Leo fans", "leo").await;
    let cookie = app.login(&leo).await;

    let group_id = group.id.to_string();
    let response = app
        .post_multipart(
            "/create/",
            &[Part::Text("text", "  War and Peace  "), Part::Text("group", &group_id)],
            Some(&cookie),
        )
        .await;

    assert_eq!(location(&response), "/profile/leo/");

    let posts = app.repo.list_posts(PostFilter::All, 0, 10).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].post.text, "War and Peace");
    assert_eq!(posts[0].post.author_id, leo.id);
    assert_eq!(posts[0].group.as_ref().map(|g| g.id), Some(group.id));
}

#[tokio::test]
async fn blank_post_is_not_saved() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart("/create/", &[Part::Text("text", "   ")], Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["errors"]["text"][0], BLANK_POST_TEXT);
    assert_eq!(page["is_edit"], false);
    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn missing_text_field_is_blank() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart("/create/", &[Part::Text("group", "")], Some(&cookie))
        .await;

    let page = body_json(response).await;
    assert_eq!(page["errors"]["text"][0], BLANK_POST_TEXT);
    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn anonymous_create_redirects_to_login() {
    let app = setup().await;

    let response = app
        .post_multipart("/create/", &[Part::Text("text", "hello")], None)
        .await;
    assert_eq!(location(&response), "/auth/login/?next=%2Fcreate%2F");

    let response = app.get("/create/", None).await;
    assert_eq!(location(&response), "/auth/login/?next=%2Fcreate%2F");

    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn create_form_lists_groups() {
    let app = setup().await;
    let leo = app.user("leo").await;
    app.group("Leo fans", "leo").await;
    let cookie = app.login(&leo).await;

    let page = body_json(app.get("/create/", Some(&cookie)).await).await;

    assert_eq!(page["groups"][0]["slug"], "leo");
    assert_eq!(page["is_edit"], false);
    assert!(page["post_id"].is_null());
}

#[tokio::test]
async fn unknown_group_is_a_form_error() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let missing = uuid::Uuid::now_v7().to_string();
    for group in [missing.as_str(), "not-an-id"] {
        let response = app
            .post_multipart(
                "/create/",
                &[Part::Text("text", "text"), Part::Text("group", group)],
                Some(&cookie),
            )
            .await;

        let page = body_json(response).await;
        assert_eq!(page["errors"]["group"][0], UNKNOWN_GROUP);
    }

    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn image_is_stored_under_media_root() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart(
            "/create/",
            &[
                Part::Text("text", "with a picture"),
                Part::File {
                    name: "image",
                    file_name: "small.gif",
                    content_type: "image/gif",
                    bytes: SMALL_GIF,
                },
            ],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let posts = app.repo.list_posts(PostFilter::All, 0, 1).await.unwrap();
    let path = posts[0].post.image.clone().unwrap();
    assert!(path.starts_with("posts/"));
    assert!(app.media.path().join(&path).exists());

    let detail = body_json(app.get(&format!("/posts/{}/", posts[0].post.id), None).await).await;
    assert_eq!(detail["post"]["image"]["url"], format!("/media/{path}"));
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart(
            "/create/",
            &[
                Part::Text("text", "with a picture"),
                Part::File {
                    name: "image",
                    file_name: "notes.txt",
                    content_type: "text/plain",
                    bytes: b"not an image",
                },
            ],
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["errors"]["image"][0], INVALID_IMAGE);
    assert_eq!(page["form"]["text"], "with a picture");
    assert_eq!(app.post_count().await, 0);
}

#[tokio::test]
async fn text_sent_as_png_is_rejected() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart(
            "/create/",
            &[
                Part::Text("text", "with a picture"),
                Part::File {
                    name: "image",
                    file_name: "picture.png",
                    content_type: "image/png",
                    bytes: b"definitely not a png",
                },
            ],
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["errors"]["image"][0], INVALID_IMAGE);
    assert_eq!(app.post_count().await, 0);
    assert!(!app.media.path().join("posts").exists());
}

#[tokio::test]
async fn non_author_edit_redirects_to_detail() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let intruder = app.user("intruder").await;
    let post = app.post(&leo, "original text", None).await;
    let cookie = app.login(&intruder).await;

    let edit_url = format!("/posts/{}/edit/", post.id);
    let detail_url = format!("/posts/{}/", post.id);

    let response = app.get(&edit_url, Some(&cookie)).await;
    assert_eq!(location(&response), detail_url);

    let response = app
        .post_multipart(&edit_url, &[Part::Text("text", "hijacked")], Some(&cookie))
        .await;
    assert_eq!(location(&response), detail_url);

    let stored = app.repo.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.post.text, "original text");
}

#[tokio::test]
async fn author_edits_post() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let group = app.group("Leo fans", "leo").await;
    let post = app.post(&leo, "draft", Some(&group)).await;
    let cookie = app.login(&leo).await;
    let edit_url = format!("/posts/{}/edit/", post.id);

    let form = body_json(app.get(&edit_url, Some(&cookie)).await).await;
    assert_eq!(form["is_edit"], true);
    assert_eq!(form["form"]["text"], "draft");
    assert_eq!(form["form"]["group"], group.id.to_string());

    let response = app
        .post_multipart(&edit_url, &[Part::Text("text", "final")], Some(&cookie))
        .await;
    assert_eq!(location(&response), format!("/posts/{}/", post.id));

    let stored = app.repo.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.post.text, "final");
    assert_eq!(stored.post.group_id, None);
    assert_eq!(stored.post.created_at, post.created_at);
}

#[tokio::test]
async fn blank_edit_keeps_post() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let post = app.post(&leo, "draft", None).await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart(
            &format!("/posts/{}/edit/", post.id),
            &[Part::Text("text", "")],
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["errors"]["text"][0], BLANK_POST_TEXT);
    assert_eq!(page["is_edit"], true);

    let stored = app.repo.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.post.text, "draft");
}

#[tokio::test]
async fn detail_shows_preview_and_counts() {
    let app = setup().await;
    let leo = app.user("leo").await;
    app.post(&leo, "first", None).await;
    let post = app
        .post(&leo, "Happy families are all alike; every unhappy family", None)
        .await;

    let detail = body_json(app.get(&format!("/posts/{}/", post.id), None).await).await;

    assert_eq!(detail["title"], "Post Happy families are all alike; ...");
    assert_eq!(detail["author_posts_count"], 2);
    assert_eq!(detail["can_edit"], false);
    assert_eq!(detail["comments"].as_array().unwrap().len(), 0);
    assert_eq!(detail["form"]["text"], "");
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    let missing = uuid::Uuid::now_v7();
    for uri in [
        format!("/posts/{missing}/"),
        String::from("/posts/12/"),
        format!("/posts/{missing}/edit/"),
    ] {
        let response = app.get(&uri, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn author_deletes_post_with_image() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let cookie = app.login(&leo).await;

    app.post_multipart(
        "/create/",
        &[
            Part::Text("text", "short lived"),
            Part::File {
                name: "image",
                file_name: "small.gif",
                content_type: "image/gif",
                bytes: SMALL_GIF,
            },
        ],
        Some(&cookie),
    )
    .await;

    let post = app.repo.list_posts(PostFilter::All, 0, 1).await.unwrap()[0].clone();
    let image = app.media.path().join(post.post.image.as_deref().unwrap());
    assert!(image.exists());

    let stranger = app.user("stranger").await;
    let stranger_cookie = app.login(&stranger).await;
    let delete_url = format!("/posts/{}/delete/", post.post.id);

    let response = app.post_form(&delete_url, "", Some(&stranger_cookie)).await;
    assert_eq!(location(&response), format!("/posts/{}/", post.post.id));
    assert_eq!(app.post_count().await, 1);

    let response = app.post_form(&delete_url, "", Some(&cookie)).await;
    assert_eq!(location(&response), "/profile/leo/");
    assert_eq!(app.post_count().await, 0);
    assert!(!image.exists());
}
