use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Json, Router,
};
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    common::models::FormErrors,
    posts::{
        routes::{detail_response, find_post_entry, post_url},
        PostsError,
    },
    users::models::UserRole,
    AppState, InnerAppState,
};

use super::models::{Comment, CommentForm, CommentFormResponse};

pub fn comments_router() -> Router<AppState> {
    Router::new().route("/posts/:post_id/comment/", post(add_comment))
}

/// Comment on a post
#[utoipa::path(
    post,
    path = "/posts/{post_id}/comment/",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Comment added, redirected to the post. Anonymous callers are redirected to login"),
        (status = 200, description = "Blank comment, post shown again with the form errors", body = PostDetailResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    ),
    tag = "Comments API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn add_comment(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Path(post_id): Path<String>,
    Form(payload): Form<CommentForm>,
) -> Result<Response, PostsError> {
    let entry = find_post_entry(&state, &post_id).await?;
    let post_id = entry.post.id;

    let payload = CommentForm {
        text: payload.text.trim().to_string(),
    };

    if let Err(e) = payload.validate(&()) {
        let form = CommentFormResponse {
            text: payload.text,
            errors: FormErrors::from(e),
        };

        let detail = detail_response(&state, entry, Some(auth.current_user.id), form).await?;
        return Ok(Json(detail).into_response());
    }

    let comment = Comment {
        id: Uuid::now_v7(),
        text: payload.text,
        created_at: Utc::now(),
        post_id,
        author_id: auth.current_user.id,
    };

    state.repo.create_comment(comment).await?;

    tracing::debug!(
        "{} commented on post {post_id}",
        auth.current_user.username
    );

    Ok(Redirect::to(&post_url(post_id)).into_response())
}
