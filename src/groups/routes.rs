use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use garde::Validate;
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    common::pagination::PageParams,
    db::PostFilter,
    posts::feed::feed_page,
    users::models::UserRole,
    AppState, InnerAppState,
};

use super::{
    models::{CreateGroup, Group, GroupPageResponse, GroupResponse},
    utils::{is_valid_slug, slugify},
    GroupsError,
};

pub fn groups_router() -> Router<AppState> {
    Router::new()
        .route("/group/", post(create_group))
        .route("/group/:slug/", get(group_posts))
}

/// Posts of a group
#[utoipa::path(
    get,
    path = "/group/{slug}/",
    params(("slug" = String, Path, description = "Group slug"), PageParams),
    responses(
        (status = 200, description = "Group and a page of its posts", body = GroupPageResponse),
        (status = 404, description = "Unknown slug", body = ErrorResponse),
    ),
    tag = "Groups API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn group_posts(
    State(state): State<Arc<InnerAppState>>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<GroupPageResponse>, GroupsError> {
    let group = state
        .repo
        .find_group_by_slug(&slug)
        .await?
        .ok_or(GroupsError::GroupNotFound)?;

    let page = feed_page(&state, PostFilter::Group(group.id), params.requested()).await?;

    Ok(Json(GroupPageResponse {
        group: group.into_response(),
        page,
    }))
}

/// Create a group
#[utoipa::path(
    post,
    path = "/group/",
    request_body(content = CreateGroup, content_type = "application/json"),
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Fields validation error", body = ErrorResponse),
        (status = 403, description = "Caller isn't staff", body = ErrorResponse),
        (status = 409, description = "Slug already taken", body = ErrorResponse),
    ),
    tag = "Groups API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn create_group(
    _auth: AuthExtractor<{ UserRole::Staff as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Json(payload): Json<CreateGroup>,
) -> Result<(StatusCode, Json<GroupResponse>), GroupsError> {
    payload.validate(&())?;

    let slug = match payload.slug {
        Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
        _ => slugify(&payload.title),
    };

    if !is_valid_slug(&slug) {
        return Err(GroupsError::InvalidSlug);
    }

    let group = state
        .repo
        .create_group(Group {
            id: Uuid::now_v7(),
            title: payload.title.trim().to_string(),
            slug,
            description: payload.description,
        })
        .await?;

    tracing::info!("created group {group}");

    Ok((StatusCode::CREATED, Json(group.into_response())))
}
