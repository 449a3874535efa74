use axum::{extract::multipart::MultipartError, http::StatusCode, response::IntoResponse};

use crate::{db::DbError, media::MediaError, ErrorResponse};

pub mod comments;
pub mod feed;
pub mod models;
pub mod routes;

#[derive(thiserror::Error, Debug)]
pub enum PostsError {
    #[error("post not found")]
    PostNotFound,

    #[error("bad request")]
    BadRequest,

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for PostsError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            PostsError::PostNotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: self.to_string(),
                    ..Default::default()
                },
            )
                .into_response(),
            PostsError::Db(DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: String::from("not found"),
                    ..Default::default()
                },
            )
                .into_response(),
            PostsError::Db(DbError::Conflict(message)) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: message,
                    ..Default::default()
                },
            )
                .into_response(),
            PostsError::BadRequest | PostsError::Multipart(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: String::from("bad request"),
                    ..Default::default()
                },
            )
                .into_response(),
            PostsError::Db(_) | PostsError::Media(_) | PostsError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
