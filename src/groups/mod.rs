use axum::{http::StatusCode, response::IntoResponse};

use crate::{db::DbError, ErrorResponse};

pub mod models;
pub mod routes;
pub mod utils;

#[derive(thiserror::Error, Debug)]
pub enum GroupsError {
    #[error("group not found")]
    GroupNotFound,

    #[error("invalid slug, use letters, numbers and underscores")]
    InvalidSlug,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Validator(#[from] garde::Errors),
}

impl IntoResponse for GroupsError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("{:#?}", self);

        match self {
            GroupsError::GroupNotFound | GroupsError::Db(DbError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: String::from("group not found"),
                    ..Default::default()
                },
            )
                .into_response(),
            GroupsError::InvalidSlug => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: self.to_string(),
                    ..Default::default()
                },
            )
                .into_response(),
            GroupsError::Db(DbError::Conflict(message)) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: message,
                    ..Default::default()
                },
            )
                .into_response(),
            GroupsError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            GroupsError::Validator(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: String::from("invalid input"),
                    details: Some(
                        errors
                            .flatten()
                            .iter()
                            .map(|(path, error)| format!("{path}: {error}"))
                            .collect::<Vec<String>>(),
                    ),
                },
            )
                .into_response(),
        }
    }
}
