use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::models::{is_blank, FormErrors},
    posts::models::Post,
    schema::comments,
    users::models::{User, UserResponseBrief},
};

pub const BLANK_COMMENT_TEXT: &str = "Comment text must not be blank.";

#[derive(
    Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq,
)]
#[diesel(belongs_to(Post))]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: Uuid,
    pub author_id: Uuid,
}

impl Comment {
    pub fn into_response(self, author: User) -> CommentResponse {
        CommentResponse {
            id: self.id,
            text: self.text,
            created_at: self.created_at,
            author: author.into_response_brief(),
        }
    }
}

#[derive(Debug, Default, Validate, Deserialize, ToSchema)]
pub struct CommentForm {
    #[serde(default)]
    #[garde(custom(not_blank_comment))]
    pub text: String,
}

fn not_blank_comment(value: &str, _: &()) -> garde::Result {
    if is_blank(value) {
        return Err(garde::Error::new(BLANK_COMMENT_TEXT));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CommentResponse {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: UserResponseBrief,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CommentFormResponse {
    pub text: String,
    pub errors: FormErrors,
}
