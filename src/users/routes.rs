use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use garde::Validate;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    auth::AuthExtractor,
    common::{models::FormErrors, pagination::PageParams},
    db::{DbError, PostFilter},
    posts::feed::feed_page,
    sessions::{end_session, models::Session, start_session, UserSession},
    AppState, InnerAppState,
};

use super::{
    models::{Login, LoginPage, LoginParams, ProfileResponse, SignUp, User, UserRole},
    UsersError,
};

pub const INVALID_LOGIN: &str = "Please enter a correct username and password.";

/// Errors that belong to the whole form rather than one field.
const NON_FIELD_ERRORS: &str = "__all__";

pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/profile/:username/", get(profile))
        .route("/auth/login/", get(login_page).post(login))
        .route("/auth/signup/", post(signup))
        .route("/auth/logout/", get(logout).post(logout))
}

/// Author profile with a page of their posts
#[utoipa::path(
    get,
    path = "/profile/{username}/",
    params(("username" = String, Path, description = "Author username"), PageParams),
    responses(
        (status = 200, description = "Author, counters and a page of their posts", body = ProfileResponse),
        (status = 404, description = "Unknown username", body = ErrorResponse),
    ),
    tag = "Users API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn profile(
    auth: Option<AuthExtractor<{ UserRole::User as u32 }>>,
    State(state): State<Arc<InnerAppState>>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProfileResponse>, UsersError> {
    let author = state
        .repo
        .find_user_by_username(&username)
        .await?
        .ok_or(UsersError::UserNotFound)?;

    let following = match auth {
        Some(auth) if auth.current_user.id != author.id => {
            state
                .repo
                .is_following(auth.current_user.id, author.id)
                .await?
        }
        _ => false,
    };

    let page = feed_page(&state, PostFilter::Author(author.id), params.requested()).await?;

    Ok(Json(ProfileResponse {
        posts_count: page.count,
        followers_count: state.repo.count_followers(author.id).await?,
        following_count: state.repo.count_following(author.id).await?,
        following,
        author: author.into_response_brief(),
        page,
    }))
}

/// Login form
#[utoipa::path(
    get,
    path = "/auth/login/",
    params(LoginParams),
    responses(
        (status = 200, description = "Empty login form", body = LoginPage),
    ),
    tag = "Users API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn login_page(Query(params): Query<LoginParams>) -> Json<LoginPage> {
    Json(LoginPage {
        next: params.next,
        username: None,
        errors: FormErrors::default(),
    })
}

/// Log in
#[utoipa::path(
    post,
    path = "/auth/login/",
    request_body(content = Login, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirected to `next` or the index"),
        (status = 200, description = "Wrong credentials, form shown again", body = LoginPage),
    ),
    tag = "Users API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<Arc<InnerAppState>>,
    cookies: Cookies,
    Form(payload): Form<Login>,
) -> Result<Response, UsersError> {
    let user = state.repo.find_user_by_username(&payload.username).await?;

    let Some(user) = user.filter(|user| password_matches(&payload.password, &user.password)) else {
        tracing::debug!("failed login for {}", payload.username);

        let mut errors = FormErrors::default();
        errors.add(NON_FIELD_ERRORS, INVALID_LOGIN);

        return Ok(Json(LoginPage {
            next: payload.next,
            username: Some(payload.username),
            errors,
        })
        .into_response());
    };

    let session = state
        .repo
        .create_session(Session::new(user.id, state.session_ttl))
        .await?;

    start_session(&cookies, &state.cookies_key, session.id);

    tracing::info!("{} logged in", user.username);

    let next = payload
        .next
        .as_deref()
        .filter(|next| is_safe_redirect(next))
        .unwrap_or("/");

    Ok(Redirect::to(next).into_response())
}

/// Sign up and log in
#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = SignUp, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created and logged in, redirected to the index"),
        (status = 200, description = "Invalid or taken username, form shown again", body = LoginPage),
    ),
    tag = "Users API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn signup(
    State(state): State<Arc<InnerAppState>>,
    cookies: Cookies,
    Form(payload): Form<SignUp>,
) -> Result<Response, UsersError> {
    let signup_page = |errors: FormErrors, username: String| {
        Json(LoginPage {
            next: None,
            username: Some(username),
            errors,
        })
        .into_response()
    };

    if let Err(e) = payload.validate(&()) {
        return Ok(signup_page(FormErrors::from(e), payload.username));
    }

    let username = payload.username.clone();
    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)?
        .to_string();

    let user = User {
        id: Uuid::now_v7(),
        username: payload.username,
        password: hashed_password,
        role: UserRole::User,
        created_at: Utc::now(),
    };

    let user = match state.repo.create_user(user).await {
        Ok(user) => user,
        Err(DbError::Conflict(message)) => {
            let mut errors = FormErrors::default();
            errors.add("username", message);
            return Ok(signup_page(errors, username));
        }
        Err(e) => return Err(e.into()),
    };

    let session = state
        .repo
        .create_session(Session::new(user.id, state.session_ttl))
        .await?;

    start_session(&cookies, &state.cookies_key, session.id);

    tracing::info!("signed up {}", user.username);

    Ok(Redirect::to("/").into_response())
}

/// Log out
#[utoipa::path(
    post,
    path = "/auth/logout/",
    responses(
        (status = 303, description = "Session ended, redirected to the index"),
    ),
    tag = "Users API"
)]
#[axum::debug_handler(state = AppState)]
pub async fn logout(
    session: UserSession,
    State(state): State<Arc<InnerAppState>>,
    cookies: Cookies,
) -> Result<Redirect, UsersError> {
    if let Some(session_id) = session.session_id {
        state.repo.delete_session(session_id).await?;
    }

    end_session(&cookies, &state.cookies_key);

    Ok(Redirect::to("/"))
}

fn password_matches(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::error!("stored password hash can't be parsed");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Only site-relative paths are followed after login.
fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && next.is_ascii()
        && !next.chars().any(|c| c.is_ascii_control())
}
