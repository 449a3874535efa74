use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error::DatabaseError};
use diesel_async::pooled_connection::deadpool::PoolError;
use uuid::Uuid;

use crate::{
    follows::models::Follow,
    groups::models::Group,
    posts::{
        comments::models::Comment,
        models::{Post, PostChanges, PostEntry},
    },
    sessions::models::Session,
    users::models::User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub const USERNAME_TAKEN: &str = "a user with that username already exists";
pub const SLUG_TAKEN: &str = "a group with that slug already exists";
pub const ALREADY_FOLLOWING: &str = "already following this author";
pub const SELF_FOLLOW: &str = "users can't follow themselves";

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Diesel(diesel::result::Error),

    #[error(transparent)]
    PoolError(#[from] PoolError),
}

impl From<diesel::result::Error> for DbError {
    fn from(error: diesel::result::Error) -> Self {
        let constraint = match &error {
            diesel::result::Error::NotFound => return DbError::NotFound,
            DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::CheckViolation,
                info,
            ) => info.constraint_name().map(str::to_owned),
            _ => None,
        };

        match constraint.as_deref() {
            Some("users_username_key") => DbError::Conflict(USERNAME_TAKEN.into()),
            Some("groups_slug_key") => DbError::Conflict(SLUG_TAKEN.into()),
            Some("follows_pkey") => DbError::Conflict(ALREADY_FOLLOWING.into()),
            Some("follows_no_self_follow") => DbError::Conflict(SELF_FOLLOW.into()),
            _ => DbError::Diesel(error),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Which posts a feed is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts of every author the given user follows.
    FollowedBy(Uuid),
}

/// Storage used by the handlers.
///
/// Feeds are returned newest first. Comments are returned oldest first.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_user(&self, user: User) -> DbResult<User>;
    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>>;

    async fn create_session(&self, session: Session) -> DbResult<Session>;
    /// Returns the session and its user when the session exists and hasn't expired at `now`.
    async fn find_session_user(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<(User, Session)>>;
    /// Moves the expiry of a session that is still live at `now`. Expired sessions stay expired.
    async fn refresh_session(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()>;
    async fn delete_session(&self, session_id: Uuid) -> DbResult<()>;

    async fn create_group(&self, group: Group) -> DbResult<Group>;
    async fn find_group(&self, group_id: Uuid) -> DbResult<Option<Group>>;
    async fn find_group_by_slug(&self, slug: &str) -> DbResult<Option<Group>>;
    async fn list_groups(&self) -> DbResult<Vec<Group>>;

    async fn create_post(&self, post: Post) -> DbResult<Post>;
    async fn find_post(&self, post_id: Uuid) -> DbResult<Option<PostEntry>>;
    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> DbResult<Post>;
    /// Deletes the post together with its comments.
    async fn delete_post(&self, post_id: Uuid) -> DbResult<Post>;
    async fn count_posts(&self, filter: PostFilter) -> DbResult<i64>;
    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> DbResult<Vec<PostEntry>>;

    async fn create_comment(&self, comment: Comment) -> DbResult<Comment>;
    async fn list_comments(&self, post_id: Uuid) -> DbResult<Vec<(Comment, User)>>;

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> DbResult<bool>;
    /// Returns `false` when the relation already existed.
    async fn create_follow(&self, follow: Follow) -> DbResult<bool>;
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> DbResult<()>;
    async fn count_followers(&self, author_id: Uuid) -> DbResult<i64>;
    async fn count_following(&self, user_id: Uuid) -> DbResult<i64>;
}
