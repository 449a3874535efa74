use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};

use crate::{
    auth::AuthExtractor,
    common::pagination::PageParams,
    db::{DbError, PostFilter},
    posts::{feed::feed_page, models::PostsPage, routes::profile_url},
    users::models::{User, UserRole},
    AppState, InnerAppState,
};

use super::{models::Follow, FollowsError};

pub fn follows_router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route(
            "/profile/:username/follow/",
            get(profile_follow).post(profile_follow),
        )
        .route(
            "/profile/:username/unfollow/",
            get(profile_unfollow).post(profile_unfollow),
        )
}

/// Posts of followed authors
#[utoipa::path(
    get,
    path = "/follow/",
    params(PageParams),
    responses(
        (status = 200, description = "Newest posts of the authors the caller follows", body = PostsPage),
        (status = 303, description = "Anonymous caller, redirected to login"),
    ),
    tag = "Follows API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn follow_index(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PostsPage>, FollowsError> {
    let page = feed_page(
        &state,
        PostFilter::FollowedBy(auth.current_user.id),
        params.requested(),
    )
    .await?;

    Ok(Json(page))
}

/// Follow an author
///
/// Following yourself or someone already followed changes nothing.
#[utoipa::path(
    get,
    path = "/profile/{username}/follow/",
    params(("username" = String, Path, description = "Author username")),
    responses(
        (status = 303, description = "Redirected to the author's profile. Anonymous callers are redirected to login"),
        (status = 404, description = "Unknown username", body = ErrorResponse),
    ),
    tag = "Follows API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn profile_follow(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Path(username): Path<String>,
) -> Result<Redirect, FollowsError> {
    let author = find_author(&state, &username).await?;

    if author.id == auth.current_user.id {
        tracing::debug!("{username} tried to follow themselves");
        return Ok(Redirect::to(&profile_url(&author.username)));
    }

    let created = state
        .repo
        .create_follow(Follow {
            user_id: auth.current_user.id,
            author_id: author.id,
        })
        .await?;

    if created {
        tracing::debug!("{} follows {}", auth.current_user.username, author.username);
    }

    Ok(Redirect::to(&profile_url(&author.username)))
}

/// Unfollow an author
#[utoipa::path(
    get,
    path = "/profile/{username}/unfollow/",
    params(("username" = String, Path, description = "Author username")),
    responses(
        (status = 303, description = "Redirected to the author's profile. Anonymous callers are redirected to login"),
        (status = 404, description = "Unknown username or not following", body = ErrorResponse),
    ),
    tag = "Follows API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn profile_unfollow(
    auth: AuthExtractor<{ UserRole::User as u32 }>,
    State(state): State<Arc<InnerAppState>>,
    Path(username): Path<String>,
) -> Result<Redirect, FollowsError> {
    let author = find_author(&state, &username).await?;

    match state
        .repo
        .delete_follow(auth.current_user.id, author.id)
        .await
    {
        Ok(()) => {}
        Err(DbError::NotFound) => return Err(FollowsError::NotFollowing),
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&profile_url(&author.username)))
}

async fn find_author(state: &InnerAppState, username: &str) -> Result<User, FollowsError> {
    state
        .repo
        .find_user_by_username(username)
        .await?
        .ok_or(FollowsError::AuthorNotFound)
}
