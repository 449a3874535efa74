use std::{sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use cache::PageCache;
use common::pagination::Paginator;
use config::Config;
use db::Repository;
use media::MediaStorage;
use serde::{Deserialize, Serialize};
use tower_cookies::{CookieManagerLayer, Key};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

pub mod auth;
pub mod cache;
pub mod common;
pub mod config;
pub mod db;
pub mod follows;
pub mod groups;
pub mod media;
pub mod migrations;
pub mod posts;
pub mod schema;
pub mod sessions;
pub mod users;

/// Largest accepted request body, sized for a post with its image.
pub const FILE_SIZE_LIMIT_MB: usize = 5;

const FILE_SIZE_LIMIT: usize = FILE_SIZE_LIMIT_MB * 1024 * 1024;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub inner: Arc<InnerAppState>,
}

pub struct InnerAppState {
    pub repo: Arc<dyn Repository>,
    pub media: MediaStorage,
    pub index_cache: PageCache,
    pub paginator: Paginator,
    pub cookies_key: Key,
    pub session_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(config: &Config, repo: Arc<dyn Repository>) -> Self {
        let cookies_key = match config.cookies_key() {
            Some(key) => key,
            None => {
                tracing::warn!("no usable cookies secret configured, sessions won't survive a restart");
                Key::generate()
            }
        };

        Self {
            inner: Arc::new(InnerAppState {
                repo,
                media: MediaStorage::new(&config.media_root, &config.media_url),
                index_cache: PageCache::new(
                    "index_page",
                    Duration::from_secs(config.index_cache_ttl_secs),
                ),
                paginator: Paginator::new(config.posts_per_page),
                cookies_key,
                session_ttl: chrono::Duration::hours(config.session_ttl_hours),
            }),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(posts::routes::posts_router())
        .merge(groups::routes::groups_router())
        .merge(users::routes::users_router())
        .merge(follows::routes::follows_router())
        .route("/api-docs/openapi.json", get(openapi))
        .fallback(page_not_found)
        .layer(DefaultBodyLimit::max(FILE_SIZE_LIMIT))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            sessions::refresh_session,
        ))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        posts::routes::index,
        posts::routes::post_detail,
        posts::routes::post_create_form,
        posts::routes::post_create,
        posts::routes::post_edit_form,
        posts::routes::post_edit,
        posts::routes::post_delete,
        posts::comments::routes::add_comment,
        groups::routes::group_posts,
        groups::routes::create_group,
        users::routes::profile,
        users::routes::login_page,
        users::routes::login,
        users::routes::signup,
        users::routes::logout,
        follows::routes::follow_index,
        follows::routes::profile_follow,
        follows::routes::profile_unfollow,
    ),
    components(
        schemas(posts::models::PostResponse),
        schemas(posts::models::PostsPage),
        schemas(posts::models::PostDetailResponse),
        schemas(posts::models::PostFormResponse),
        schemas(posts::models::PostFormValues),
        schemas(posts::comments::models::CommentResponse),
        schemas(posts::comments::models::CommentFormResponse),
        schemas(posts::comments::models::CommentForm),
        schemas(groups::models::GroupResponse),
        schemas(groups::models::GroupPageResponse),
        schemas(groups::models::CreateGroup),
        schemas(users::models::UserRole),
        schemas(users::models::UserResponseBrief),
        schemas(users::models::ProfileResponse),
        schemas(users::models::LoginPage),
        schemas(users::models::Login),
        schemas(users::models::SignUp),
        schemas(common::models::ImageResponse),
        schemas(common::models::FormErrors),
        schemas(ErrorResponse),
    ),
    tags(
        (name = "Posts API"),
        (name = "Comments API"),
        (name = "Groups API"),
        (name = "Users API"),
        (name = "Follows API"),
    )
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn page_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        ErrorResponse {
            error: String::from("page not found"),
            ..Default::default()
        },
    )
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Default)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}
