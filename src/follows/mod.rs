use axum::{http::StatusCode, response::IntoResponse};

use crate::{db::DbError, ErrorResponse};

pub mod models;
pub mod routes;

#[derive(thiserror::Error, Debug)]
pub enum FollowsError {
    #[error("author not found")]
    AuthorNotFound,

    #[error("you are not following this author")]
    NotFollowing,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl IntoResponse for FollowsError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            FollowsError::AuthorNotFound | FollowsError::NotFollowing => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: self.to_string(),
                    ..Default::default()
                },
            )
                .into_response(),
            FollowsError::Db(DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: String::from("not found"),
                    ..Default::default()
                },
            )
                .into_response(),
            FollowsError::Db(DbError::Conflict(message)) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: message,
                    ..Default::default()
                },
            )
                .into_response(),
            FollowsError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
