pub mod models;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use chrono::Utc;
use tower_cookies::{cookie::SameSite, Cookie, Cookies, Key};
use uuid::Uuid;

use crate::{db::DbError, AppState, ErrorResponse};

pub const SESSION_COOKIE_NAME: &str = "session_id";

/// Session id carried by the request's private cookie, if any.
pub struct UserSession {
    pub session_id: Option<Uuid>,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("invalid session")]
    InvalidSession,

    #[error("something went wrong")]
    Db(#[from] DbError),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            SessionError::InvalidSession => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: self.to_string(),
                    ..Default::default()
                },
            )
                .into_response(),
            SessionError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserSession {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies =
            parts
                .extract::<Cookies>()
                .await
                .map_err(|(_error_status, error_message)| {
                    tracing::error!(
                        "session-extractor: failed to get private cookie jar: {error_message}"
                    );
                    SessionError::InvalidSession
                })?;

        let Some(cookie) = cookies.private(&state.inner.cookies_key).get(SESSION_COOKIE_NAME) else {
            return Ok(Self { session_id: None });
        };

        let session_id = Uuid::parse_str(cookie.value())
            .map_err(|e| {
                tracing::error!("session-extractor: invalid session_id: {e}");
            })
            .ok();

        Ok(Self { session_id })
    }
}

/// Pushes the expiry of a live session forward on every request. Expired sessions are left alone.
pub async fn refresh_session<B>(
    session: UserSession,
    State(state): State<AppState>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, SessionError> {
    if let Some(session_id) = session.session_id {
        tracing::debug!("refreshing session {session_id}");

        let now = Utc::now();

        state
            .inner
            .repo
            .refresh_session(session_id, now, now + state.inner.session_ttl)
            .await?;
    }

    Ok(next.run(request).await)
}

pub fn start_session(cookies: &Cookies, key: &Key, session_id: Uuid) {
    let cookie = Cookie::build(SESSION_COOKIE_NAME, session_id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    cookies.private(key).add(cookie);
}

pub fn end_session(cookies: &Cookies, key: &Key) {
    let mut cookie = Cookie::named(SESSION_COOKIE_NAME);
    cookie.set_path("/");

    cookies.private(key).remove(cookie);
}
