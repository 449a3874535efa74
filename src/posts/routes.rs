use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    common::{
        models::{FormErrors, ImageResponse},
        pagination::PageParams,
    },
    db::PostFilter,
    groups::models::Group,
    media::{is_allowed_image, is_image_data, Upload},
    posts::comments::{models::CommentFormResponse, routes::comments_router},
    users::models::UserRole,
    AppState, InnerAppState,
};

use super::{
    feed::feed_page,
    models::{
        Post, PostChanges, PostDetailResponse, PostEntry, PostForm, PostFormResponse,
        PostFormValues, INVALID_IMAGE, UNKNOWN_GROUP,
    },
    PostsError,
};

pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/create/", get(post_create_form).post(post_create))
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(post_edit_form).post(post_edit))
        .route("/posts/:post_id/delete/", post(post_delete))
        .merge(comments_router())
}

pub fn post_url(post_id: Uuid) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

/// Index feed
///
/// Rendered pages are cached per page number for a short while.
#[utoipa::path(
    get,
    path = "/",
    params(PageParams),
    responses(
        (status = 200, description = "Newest posts", body = PostsPage),
        (status = 500, description = "Something went wrong", body = ErrorResponse),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn index(
    State(state): State<Arc<InnerAppState>>,
    Query(params): Query<PageParams>,
) -> Result<Response, PostsError> {
    let requested = params.requested();
    let key = requested.unwrap_or(1).to_string();

    if let Some(body) = state.index_cache.get(&key).await {
        tracing::debug!("index page {key} served from cache");
        return Ok(json_body(body));
    }

    let page = feed_page(&state, PostFilter::All, requested).await?;
    let body = Bytes::from(serde_json::to_vec(&page)?);

    state.index_cache.insert(&key, body.clone()).await;

    Ok(json_body(body))
}

fn json_body(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Post detail with its comments
#[utoipa::path(
    get,
    path = "/posts/{post_id}/",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post, its comments and an empty comment form", body = PostDetailResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn post_detail(
    auth: Option<AuthExtractor<{ UserRole::User as u32 }>>,
    State(state): State<Arc<InnerAppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<PostDetailResponse>, PostsError> {
    let entry = find_post_entry(&state, &post_id).await?;
    let viewer = auth.map(|auth| auth.current_user.id);

    let detail = detail_response(&state, entry, viewer, CommentFormResponse::default()).await?;

    Ok(Json(detail))
}

pub(crate) async fn find_post_entry(
    state: &InnerAppState,
    post_id: &str,
) -> Result<PostEntry, PostsError> {
    let post_id = Uuid::parse_str(post_id).map_err(|_| PostsError::PostNotFound)?;

    state
        .repo
        .find_post(post_id)
        .await?
        .ok_or(PostsError::PostNotFound)
}

pub(crate) async fn detail_response(
    state: &InnerAppState,
    entry: PostEntry,
    viewer: Option<Uuid>,
    form: CommentFormResponse,
) -> Result<PostDetailResponse, PostsError> {
    let author_posts_count = state
        .repo
        .count_posts(PostFilter::Author(entry.author.id))
        .await?;

    let comments = state
        .repo
        .list_comments(entry.post.id)
        .await?
        .into_iter()
        .map(|(comment, author)| comment.into_response(author))
        .collect();

    Ok(PostDetailResponse {
        title: entry.post.title_preview(),
        can_edit: viewer == Some(entry.author.id),
        post: entry.into_response(&state.media),
        author_posts_count,
        comments,
        form,
    })
}

/// Empty post form
#[utoipa::path(
    get,
    path = "/create/",
    responses(
        (status = 200, description = "Post form with the available groups", body = PostFormResponse),
        (status = 303, description = "Anonymous caller, redirected to login"),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn post_create_form(
    _auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
) -> Result<Json<PostFormResponse>, PostsError> {
    let page = form_page(
        &state,
        PostFormValues::default(),
        FormErrors::default(),
        None,
    )
    .await?;

    Ok(Json(page))
}

/// Create post
#[utoipa::path(
    post,
    path = "/create/",
    request_body(content = String, description = "Multipart fields: text, group (optional id), image (optional file)", content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Post created, redirected to the author's profile. Anonymous callers are redirected to login"),
        (status = 200, description = "Invalid form, shown again with errors", body = PostFormResponse),
        (status = 400, description = "Malformed multipart body", body = ErrorResponse),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn post_create(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    fields: Multipart,
) -> Result<Response, PostsError> {
    let PostSubmission {
        form,
        upload,
        mut errors,
    } = read_post_form(fields).await?;

    check_group(&state, &form, &mut errors).await?;

    if !errors.is_empty() {
        let values = PostFormValues {
            text: form.text,
            group: form.group,
            image: None,
        };

        let page = form_page(&state, values, errors, None).await?;
        return Ok(Json(page).into_response());
    }

    let image = match &upload {
        Some(upload) => Some(state.media.save(upload).await?),
        None => None,
    };

    let post = Post {
        id: Uuid::now_v7(),
        text: form.text,
        created_at: Utc::now(),
        author_id: auth.current_user.id,
        group_id: form.group,
        image: image.clone(),
    };

    if let Err(e) = state.repo.create_post(post).await {
        discard_image(&state, image.as_deref()).await;
        return Err(e.into());
    }

    state.index_cache.clear();

    Ok(Redirect::to(&profile_url(&auth.current_user.username)).into_response())
}

/// Post form filled with the current values
#[utoipa::path(
    get,
    path = "/posts/{post_id}/edit/",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post form for the author", body = PostFormResponse),
        (status = 303, description = "Caller isn't the author, redirected to the post. Anonymous callers are redirected to login"),
        (status = 404, description = "Post not found", body = ErrorResponse),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn post_edit_form(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Path(post_id): Path<String>,
) -> Result<Response, PostsError> {
    let entry = find_post_entry(&state, &post_id).await?;

    if entry.post.author_id != auth.current_user.id {
        return Ok(Redirect::to(&post_url(entry.post.id)).into_response());
    }

    let post_id = entry.post.id;
    let values = PostFormValues {
        image: current_image(&state, &entry.post),
        text: entry.post.text,
        group: entry.post.group_id,
    };

    let page = form_page(&state, values, FormErrors::default(), Some(post_id)).await?;

    Ok(Json(page).into_response())
}

/// Edit post
#[utoipa::path(
    post,
    path = "/posts/{post_id}/edit/",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body(content = String, description = "Multipart fields: text, group (optional id), image (optional file, keeps the current one when absent)", content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Post saved, or caller isn't the author. Redirected to the post. Anonymous callers are redirected to login"),
        (status = 200, description = "Invalid form, shown again with errors", body = PostFormResponse),
        (status = 404, description = "Post not found", body = ErrorResponse),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn post_edit(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Path(post_id): Path<String>,
    fields: Multipart,
) -> Result<Response, PostsError> {
    let entry = find_post_entry(&state, &post_id).await?;
    let post_id = entry.post.id;

    if entry.post.author_id != auth.current_user.id {
        tracing::debug!(
            "user {} tried to edit post {post_id} of another author",
            auth.current_user.username
        );
        return Ok(Redirect::to(&post_url(post_id)).into_response());
    }

    let PostSubmission {
        form,
        upload,
        mut errors,
    } = read_post_form(fields).await?;

    check_group(&state, &form, &mut errors).await?;

    if !errors.is_empty() {
        let values = PostFormValues {
            text: form.text,
            group: form.group,
            image: current_image(&state, &entry.post),
        };

        let page = form_page(&state, values, errors, Some(post_id)).await?;
        return Ok(Json(page).into_response());
    }

    let image = match &upload {
        Some(upload) => Some(state.media.save(upload).await?),
        None => None,
    };

    let changes = PostChanges {
        text: form.text,
        group_id: Some(form.group),
        image: image.clone(),
    };

    if let Err(e) = state.repo.update_post(post_id, changes).await {
        discard_image(&state, image.as_deref()).await;
        return Err(e.into());
    }

    // a new image replaces the old file
    if image.is_some() {
        discard_image(&state, entry.post.image.as_deref()).await;
    }

    state.index_cache.clear();

    Ok(Redirect::to(&post_url(post_id)).into_response())
}

/// Delete post
#[utoipa::path(
    post,
    path = "/posts/{post_id}/delete/",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 303, description = "Post deleted and redirected to the author's profile, or caller isn't the author and is redirected to the post"),
        (status = 404, description = "Post not found", body = ErrorResponse),
    ),
    tag = "Posts API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn post_delete(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Path(post_id): Path<String>,
) -> Result<Response, PostsError> {
    let entry = find_post_entry(&state, &post_id).await?;

    if entry.post.author_id != auth.current_user.id {
        return Ok(Redirect::to(&post_url(entry.post.id)).into_response());
    }

    let post = state.repo.delete_post(entry.post.id).await?;

    discard_image(&state, post.image.as_deref()).await;

    state.index_cache.clear();

    Ok(Redirect::to(&profile_url(&entry.author.username)).into_response())
}

struct PostSubmission {
    form: PostForm,
    upload: Option<Upload>,
    errors: FormErrors,
}

async fn read_post_form(mut fields: Multipart) -> Result<PostSubmission, PostsError> {
    let mut form = PostForm::default();
    let mut upload = None;
    let mut errors = FormErrors::default();

    while let Some(field) = fields.next_field().await? {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };

        match field_name.as_str() {
            "text" => form.text = field.text().await?.trim().to_string(),
            "group" => {
                let value = field.text().await?;
                let value = value.trim();

                if value.is_empty() {
                    form.group = None;
                } else if let Ok(group_id) = Uuid::parse_str(value) {
                    form.group = Some(group_id);
                } else {
                    errors.add("group", UNKNOWN_GROUP);
                }
            }
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;

                // browsers send an empty part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                if !is_allowed_image(&content_type) || !is_image_data(&bytes) {
                    tracing::debug!("rejected image {file_name} of type {content_type}");
                    errors.add("image", INVALID_IMAGE);
                    continue;
                }

                upload = Some(
                    Upload::builder()
                        .file_name(file_name)
                        .content_type(content_type)
                        .bytes(bytes)
                        .build()
                        .map_err(|_| PostsError::BadRequest)?,
                );
            }
            _ => continue,
        }
    }

    if let Err(e) = form.validate(&()) {
        errors.extend_from_garde(&e);
    }

    Ok(PostSubmission {
        form,
        upload,
        errors,
    })
}

async fn check_group(
    state: &InnerAppState,
    form: &PostForm,
    errors: &mut FormErrors,
) -> Result<(), PostsError> {
    if let Some(group_id) = form.group {
        if state.repo.find_group(group_id).await?.is_none() {
            errors.add("group", UNKNOWN_GROUP);
        }
    }

    Ok(())
}

async fn form_page(
    state: &InnerAppState,
    form: PostFormValues,
    errors: FormErrors,
    post_id: Option<Uuid>,
) -> Result<PostFormResponse, PostsError> {
    let groups = state
        .repo
        .list_groups()
        .await?
        .into_iter()
        .map(Group::into_response)
        .collect();

    Ok(PostFormResponse {
        form,
        errors,
        groups,
        is_edit: post_id.is_some(),
        post_id,
    })
}

fn current_image(state: &InnerAppState, post: &Post) -> Option<ImageResponse> {
    post.image.as_ref().map(|path| ImageResponse {
        path: path.clone(),
        url: state.media.url(path),
    })
}

async fn discard_image(state: &InnerAppState, path: Option<&str>) {
    let Some(path) = path else {
        return;
    };

    if let Err(e) = state.media.delete(path).await {
        tracing::error!("failed to remove image {path}: {e}");
    }
}
