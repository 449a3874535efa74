use std::fmt;

use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Associations, Identifiable, Insertable, Queryable, Selectable};
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{
        models::{is_blank, FormErrors, ImageResponse},
        pagination::Page,
    },
    groups::models::{Group, GroupResponse},
    media::MediaStorage,
    posts::comments::models::{CommentFormResponse, CommentResponse},
    schema::posts,
    users::models::{User, UserResponseBrief},
};

pub const BLANK_POST_TEXT: &str = "Post text must not be blank.";
pub const UNKNOWN_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str = "Upload a valid image. Accepted formats are JPEG, PNG and GIF.";

#[derive(
    Insertable, Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq,
)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(belongs_to(Group))]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(15).collect();
        f.write_str(&preview)
    }
}

impl Post {
    /// Heading shown on the detail page.
    pub fn title_preview(&self) -> String {
        let preview: String = self.text.chars().take(30).collect();
        format!("Post {preview}...")
    }
}

/// A post loaded together with its author and group.
#[derive(Debug, Clone)]
pub struct PostEntry {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

impl PostEntry {
    pub fn into_response(self, media: &MediaStorage) -> PostResponse {
        PostResponse {
            id: self.post.id,
            text: self.post.text,
            created_at: self.post.created_at,
            author: self.author.into_response_brief(),
            group: self.group.map(Group::into_response),
            image: self.post.image.map(|path| ImageResponse {
                url: media.url(&path),
                path,
            }),
        }
    }
}

/// Columns rewritten by an edit. An absent image keeps the stored one.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = posts)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<Option<Uuid>>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Validate)]
pub struct PostForm {
    #[garde(custom(not_blank_post))]
    pub text: String,
    #[garde(skip)]
    pub group: Option<Uuid>,
}

fn not_blank_post(value: &str, _: &()) -> garde::Result {
    if is_blank(value) {
        return Err(garde::Error::new(BLANK_POST_TEXT));
    }
    Ok(())
}

/// Values a post form is filled with when shown.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<Uuid>,
    pub image: Option<ImageResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostFormResponse {
    pub form: PostFormValues,
    pub errors: FormErrors,
    /// Groups a post may be filed under.
    pub groups: Vec<GroupResponse>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PostResponse {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: UserResponseBrief,
    pub group: Option<GroupResponse>,
    pub image: Option<ImageResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostsPage {
    pub posts: Vec<PostResponse>,
    pub number: i64,
    pub total_pages: i64,
    /// Number of posts across all pages.
    pub count: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<Page<PostResponse>> for PostsPage {
    fn from(page: Page<PostResponse>) -> Self {
        Self {
            has_next: page.has_next(),
            has_previous: page.has_previous(),
            number: page.number,
            total_pages: page.total_pages,
            count: page.count,
            per_page: page.per_page,
            posts: page.items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostDetailResponse {
    pub title: String,
    pub post: PostResponse,
    pub author_posts_count: i64,
    pub comments: Vec<CommentResponse>,
    pub form: CommentFormResponse,
    /// Whether the requesting user may edit or delete the post.
    pub can_edit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> Post {
        Post {
            id: Uuid::now_v7(),
            text: text.to_string(),
            created_at: Utc::now(),
            author_id: Uuid::now_v7(),
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn post_displays_first_fifteen_characters() {
        assert_eq!(post("Short").to_string(), "Short");
        assert_eq!(
            post("A rather long post about nothing").to_string(),
            "A rather long p"
        );
        assert_eq!(post("Очень длинный текст поста").to_string(), "Очень длинный т");
    }

    #[test]
    fn title_preview_takes_thirty_characters() {
        assert_eq!(
            post("0123456789012345678901234567890123456789").title_preview(),
            "Post 012345678901234567890123456789..."
        );
    }

    #[test]
    fn blank_text_is_rejected_with_message() {
        let form = PostForm {
            text: String::from("   \n"),
            group: None,
        };

        let errors = FormErrors::from(form.validate(&()).unwrap_err());
        assert_eq!(errors.get("text"), Some(&[String::from(BLANK_POST_TEXT)][..]));
    }
}
