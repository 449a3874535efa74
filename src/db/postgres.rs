use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    dsl::exists, ExpressionMethods, NullableExpressionMethods, OptionalExtension, QueryDsl,
    SelectableHelper,
};
use diesel_async::{
    pooled_connection::deadpool::{Object, Pool},
    scoped_futures::ScopedFutureExt,
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use uuid::Uuid;

use crate::{
    follows::models::Follow,
    groups::models::Group,
    posts::{
        comments::models::Comment,
        models::{Post, PostChanges, PostEntry},
    },
    schema::{comments, follows, groups, posts, sessions, users},
    sessions::models::Session,
    users::models::User,
};

use super::{DbError, DbResult, PostFilter, Repository};

pub struct PgRepository {
    pool: Pool<AsyncPgConnection>,
}

impl PgRepository {
    pub fn new(pool: Pool<AsyncPgConnection>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> DbResult<Object<AsyncPgConnection>> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: User) -> DbResult<User> {
        let mut db = self.conn().await?;

        let user = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result::<User>(&mut db)
            .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let mut db = self.conn().await?;

        let user = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first::<User>(&mut db)
            .await
            .optional()?;

        Ok(user)
    }

    async fn create_session(&self, session: Session) -> DbResult<Session> {
        let mut db = self.conn().await?;

        diesel::delete(sessions::table.filter(sessions::expires_at.le(session.created_at)))
            .execute(&mut db)
            .await?;

        let session = diesel::insert_into(sessions::table)
            .values(&session)
            .returning(Session::as_returning())
            .get_result::<Session>(&mut db)
            .await?;

        Ok(session)
    }

    async fn find_session_user(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<(User, Session)>> {
        let mut db = self.conn().await?;

        let found = sessions::table
            .inner_join(users::table)
            .filter(sessions::id.eq(session_id))
            .filter(sessions::expires_at.gt(now))
            .select((User::as_select(), Session::as_select()))
            .first::<(User, Session)>(&mut db)
            .await
            .optional()?;

        Ok(found)
    }

    async fn refresh_session(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut db = self.conn().await?;

        diesel::update(
            sessions::table
                .find(session_id)
                .filter(sessions::expires_at.gt(now)),
        )
            .set(sessions::expires_at.eq(expires_at))
            .execute(&mut db)
            .await?;

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> DbResult<()> {
        let mut db = self.conn().await?;

        diesel::delete(sessions::table.find(session_id))
            .execute(&mut db)
            .await?;

        Ok(())
    }

    async fn create_group(&self, group: Group) -> DbResult<Group> {
        let mut db = self.conn().await?;

        let group = diesel::insert_into(groups::table)
            .values(&group)
            .returning(Group::as_returning())
            .get_result::<Group>(&mut db)
            .await?;

        Ok(group)
    }

    async fn find_group(&self, group_id: Uuid) -> DbResult<Option<Group>> {
        let mut db = self.conn().await?;

        let group = groups::table
            .find(group_id)
            .select(Group::as_select())
            .first::<Group>(&mut db)
            .await
            .optional()?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> DbResult<Option<Group>> {
        let mut db = self.conn().await?;

        let group = groups::table
            .filter(groups::slug.eq(slug))
            .select(Group::as_select())
            .first::<Group>(&mut db)
            .await
            .optional()?;

        Ok(group)
    }

    async fn list_groups(&self) -> DbResult<Vec<Group>> {
        let mut db = self.conn().await?;

        let groups = groups::table
            .order(groups::title.asc())
            .select(Group::as_select())
            .load::<Group>(&mut db)
            .await?;

        Ok(groups)
    }

    async fn create_post(&self, post: Post) -> DbResult<Post> {
        let mut db = self.conn().await?;

        let post = diesel::insert_into(posts::table)
            .values(&post)
            .returning(Post::as_returning())
            .get_result::<Post>(&mut db)
            .await?;

        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> DbResult<Option<PostEntry>> {
        let mut db = self.conn().await?;

        let entry = posts::table
            .inner_join(users::table)
            .left_join(groups::table)
            .filter(posts::id.eq(post_id))
            .select((
                posts::all_columns,
                users::all_columns,
                groups::all_columns.nullable(),
            ))
            .first::<(Post, User, Option<Group>)>(&mut db)
            .await
            .optional()?;

        Ok(entry.map(|(post, author, group)| PostEntry {
            post,
            author,
            group,
        }))
    }

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> DbResult<Post> {
        let mut db = self.conn().await?;

        let post = diesel::update(posts::table.find(post_id))
            .set(&changes)
            .returning(Post::as_returning())
            .get_result::<Post>(&mut db)
            .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid) -> DbResult<Post> {
        let mut db = self.conn().await?;

        let post = db
            .transaction::<_, DbError, _>(|transaction| {
                async move {
                    diesel::delete(comments::table.filter(comments::post_id.eq(post_id)))
                        .execute(transaction)
                        .await?;

                    let post = diesel::delete(posts::table.find(post_id))
                        .returning(Post::as_returning())
                        .get_result::<Post>(transaction)
                        .await?;

                    Ok(post)
                }
                .scope_boxed()
            })
            .await?;

        Ok(post)
    }

    async fn count_posts(&self, filter: PostFilter) -> DbResult<i64> {
        let mut db = self.conn().await?;

        let count = match filter {
            PostFilter::All => posts::table.count().get_result::<i64>(&mut db).await?,
            PostFilter::Group(group_id) => {
                posts::table
                    .filter(posts::group_id.eq(group_id))
                    .count()
                    .get_result::<i64>(&mut db)
                    .await?
            }
            PostFilter::Author(author_id) => {
                posts::table
                    .filter(posts::author_id.eq(author_id))
                    .count()
                    .get_result::<i64>(&mut db)
                    .await?
            }
            PostFilter::FollowedBy(user_id) => {
                posts::table
                    .filter(
                        posts::author_id.eq_any(
                            follows::table
                                .filter(follows::user_id.eq(user_id))
                                .select(follows::author_id),
                        ),
                    )
                    .count()
                    .get_result::<i64>(&mut db)
                    .await?
            }
        };

        Ok(count)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> DbResult<Vec<PostEntry>> {
        let mut db = self.conn().await?;

        let mut query = posts::table
            .inner_join(users::table)
            .left_join(groups::table)
            .select((
                posts::all_columns,
                users::all_columns,
                groups::all_columns.nullable(),
            ))
            .order((posts::created_at.desc(), posts::id.desc()))
            .into_boxed();

        query = match filter {
            PostFilter::All => query,
            PostFilter::Group(group_id) => query.filter(posts::group_id.eq(group_id)),
            PostFilter::Author(author_id) => query.filter(posts::author_id.eq(author_id)),
            PostFilter::FollowedBy(user_id) => query.filter(
                posts::author_id.eq_any(
                    follows::table
                        .filter(follows::user_id.eq(user_id))
                        .select(follows::author_id),
                ),
            ),
        };

        let entries = query
            .offset(offset)
            .limit(limit)
            .load::<(Post, User, Option<Group>)>(&mut db)
            .await?
            .into_iter()
            .map(|(post, author, group)| PostEntry {
                post,
                author,
                group,
            })
            .collect();

        Ok(entries)
    }

    async fn create_comment(&self, comment: Comment) -> DbResult<Comment> {
        let mut db = self.conn().await?;

        let comment = diesel::insert_into(comments::table)
            .values(&comment)
            .returning(Comment::as_returning())
            .get_result::<Comment>(&mut db)
            .await?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> DbResult<Vec<(Comment, User)>> {
        let mut db = self.conn().await?;

        let comments = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select((Comment::as_select(), User::as_select()))
            .load::<(Comment, User)>(&mut db)
            .await?;

        Ok(comments)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> DbResult<bool> {
        let mut db = self.conn().await?;

        let following = diesel::select(exists(
            follows::table
                .filter(follows::user_id.eq(user_id))
                .filter(follows::author_id.eq(author_id)),
        ))
        .get_result::<bool>(&mut db)
        .await?;

        Ok(following)
    }

    async fn create_follow(&self, follow: Follow) -> DbResult<bool> {
        let mut db = self.conn().await?;

        let inserted = diesel::insert_into(follows::table)
            .values(&follow)
            .on_conflict_do_nothing()
            .execute(&mut db)
            .await?;

        Ok(inserted == 1)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> DbResult<()> {
        let mut db = self.conn().await?;

        let deleted = diesel::delete(
            follows::table
                .filter(follows::user_id.eq(user_id))
                .filter(follows::author_id.eq(author_id)),
        )
        .execute(&mut db)
        .await?;

        if deleted == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn count_followers(&self, author_id: Uuid) -> DbResult<i64> {
        let mut db = self.conn().await?;

        let count = follows::table
            .filter(follows::author_id.eq(author_id))
            .count()
            .get_result::<i64>(&mut db)
            .await?;

        Ok(count)
    }

    async fn count_following(&self, user_id: Uuid) -> DbResult<i64> {
        let mut db = self.conn().await?;

        let count = follows::table
            .filter(follows::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut db)
            .await?;

        Ok(count)
    }
}
