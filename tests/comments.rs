mod common;

use axum::http::StatusCode;
use common::{body_json, location, setup};
use yatube::{db::Repository, posts::comments::models::BLANK_COMMENT_TEXT};

#[tokio::test]
async fn comment_is_added_and_listed_oldest_first() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let reader = app.user("reader").await;
    let post = app.post(&leo, "text", None).await;
    let cookie = app.login(&reader).await;
    let comment_url = format!("/posts/{}/comment/", post.id);

    let response = app.post_form(&comment_url, "text=first", Some(&cookie)).await;
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
    app.post_form(&comment_url, "text=second", Some(&cookie))
        .await;

    let detail = body_json(app.get(&format!("/posts/{}/", post.id), None).await).await;
    let comments = detail["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "first");
    assert_eq!(comments[1]["text"], "second");
    assert_eq!(comments[0]["author"]["username"], "reader");
}

#[tokio::test]
async fn blank_comment_shows_error() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let post = app.post(&leo, "text", None).await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_form(
            &format!("/posts/{}/comment/", post.id),
            "text=+++",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["form"]["errors"]["text"][0], BLANK_COMMENT_TEXT);
    assert_eq!(detail["can_edit"], true);
    assert!(app.repo.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_comment_redirects_to_login() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let post = app.post(&leo, "text", None).await;

    let response = app
        .post_form(&format!("/posts/{}/comment/", post.id), "text=hi", None)
        .await;

    assert_eq!(
        location(&response),
        format!("/auth/login/?next=%2Fposts%2F{}%2Fcomment%2F", post.id)
    );
    assert!(app.repo.list_comments(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_on_unknown_post_is_not_found() {
    let app = setup().await;
    let reader = app.user("reader").await;
    let cookie = app.login(&reader).await;

    let response = app
        .post_form(
            &format!("/posts/{}/comment/", uuid::Uuid::now_v7()),
            "text=hi",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_post_drops_comments() {
    let app = setup().await;
    let leo = app.user("leo").await;
    let post = app.post(&leo, "text", None).await;
    let cookie = app.login(&leo).await;

    app.post_form(&format!("/posts/{}/comment/", post.id), "text=hi", Some(&cookie))
        .await;
    app.post_form(&format!("/posts/{}/delete/", post.id), "", Some(&cookie))
        .await;

    assert!(app.repo.list_comments(post.id).await.unwrap().is_empty());
}
