use axum::{http::StatusCode, response::IntoResponse};

use crate::{db::DbError, ErrorResponse};

pub mod models;
pub mod routes;

#[derive(thiserror::Error, Debug)]
pub enum UsersError {
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Argon2(#[from] argon2::password_hash::Error),
}

impl IntoResponse for UsersError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            UsersError::UserNotFound | UsersError::Db(DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: String::from("user not found"),
                    ..Default::default()
                },
            )
                .into_response(),
            UsersError::Db(DbError::Conflict(message)) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: message,
                    ..Default::default()
                },
            )
                .into_response(),
            UsersError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            UsersError::Argon2(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
