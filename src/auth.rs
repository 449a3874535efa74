use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    RequestPartsExt,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::DbError,
    sessions::{SessionError, UserSession},
    users::models::{UserResponseBrief, UserRole},
    AppState, ErrorResponse,
};

pub const LOGIN_URL: &str = "/auth/login/";

/// Current user of a request, rejected unless they hold at least `USER_ROLE`
/// (a [`UserRole`] cast to `u32`).
pub struct AuthExtractor<const USER_ROLE: u32> {
    pub current_user: UserResponseBrief,
    pub session_id: Uuid,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated { next: String },

    #[error("you don't have permission to do this")]
    Forbidden,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    SessionError(#[from] SessionError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AuthError::Unauthenticated { next } => {
                tracing::debug!("redirecting anonymous request for {next} to login");
                Redirect::to(&login_url(&next)).into_response()
            }
            AuthError::Forbidden => {
                tracing::error!("{:#?}", self);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: self.to_string(),
                        ..Default::default()
                    },
                )
                    .into_response()
            }
            AuthError::Db(_) => {
                tracing::error!("{:#?}", self);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            AuthError::SessionError(e) => e.into_response(),
        }
    }
}

/// Login page address that sends the user back to `next` afterwards.
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_URL}?next={}", urlencoding::encode(next))
}

#[async_trait]
impl<const USER_ROLE: u32> FromRequestParts<AppState> for AuthExtractor<USER_ROLE> {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let next = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| &uri.0)
            .unwrap_or(&parts.uri)
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| String::from("/"));

        let Some(session_id) = parts
            .extract_with_state::<UserSession, _>(state)
            .await?
            .session_id
        else {
            return Err(AuthError::Unauthenticated { next });
        };

        let Some((user, session)) = state
            .inner
            .repo
            .find_session_user(session_id, Utc::now())
            .await?
        else {
            tracing::debug!("auth-extractor: session {session_id} is gone or expired");
            state.inner.repo.delete_session(session_id).await?;
            return Err(AuthError::Unauthenticated { next });
        };

        let required = UserRole::from_repr(USER_ROLE).unwrap_or(UserRole::Admin);

        if !user.role.satisfies(required) {
            return Err(AuthError::Forbidden);
        }

        Ok(AuthExtractor {
            current_user: user.into_response_brief(),
            session_id: session.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_url_encodes_next() {
        assert_eq!(login_url("/create/"), "/auth/login/?next=%2Fcreate%2F");
        assert_eq!(
            login_url("/?page=2&x=1"),
            "/auth/login/?next=%2F%3Fpage%3D2%26x%3D1"
        );
    }
}
