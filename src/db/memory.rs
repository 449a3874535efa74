use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
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

use super::{
    DbError, DbResult, PostFilter, Repository, ALREADY_FOLLOWING, SELF_FOLLOW, SLUG_TAKEN,
    USERNAME_TAKEN,
};

/// Process-local storage with the same constraints as the Postgres schema.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    groups: Vec<Group>,
    /// Posts with the insertion sequence that breaks `created_at` ties.
    posts: Vec<(u64, Post)>,
    comments: Vec<Comment>,
    follows: BTreeSet<Follow>,
    seq: u64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&Follow {
                user_id,
                author_id: post.author_id,
            }),
        }
    }

    fn entry(&self, post: &Post) -> DbResult<PostEntry> {
        let author = self
            .users
            .get(&post.author_id)
            .cloned()
            .ok_or(DbError::NotFound)?;

        let group = post
            .group_id
            .and_then(|group_id| self.groups.iter().find(|g| g.id == group_id).cloned());

        Ok(PostEntry {
            post: post.clone(),
            author,
            group,
        })
    }

    fn ensure_user(&self, user_id: Uuid) -> DbResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: User) -> DbResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DbError::Conflict(USERNAME_TAKEN.into()));
        }

        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let tables = self.tables.read().await;

        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_session(&self, session: Session) -> DbResult<Session> {
        let mut tables = self.tables.write().await;

        tables.ensure_user(session.user_id)?;
        tables
            .sessions
            .retain(|_, s| s.is_live_at(session.created_at));
        tables.sessions.insert(session.id, session.clone());

        Ok(session)
    }

    async fn find_session_user(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> DbResult<Option<(User, Session)>> {
        let tables = self.tables.read().await;

        let Some(session) = tables.sessions.get(&session_id).filter(|s| s.is_live_at(now)) else {
            return Ok(None);
        };

        Ok(tables
            .users
            .get(&session.user_id)
            .map(|user| (user.clone(), session.clone())))
    }

    async fn refresh_session(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut tables = self.tables.write().await;

        if let Some(session) = tables
            .sessions
            .get_mut(&session_id)
            .filter(|s| s.is_live_at(now))
        {
            session.expires_at = expires_at;
        }

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> DbResult<()> {
        self.tables.write().await.sessions.remove(&session_id);

        Ok(())
    }

    async fn create_group(&self, group: Group) -> DbResult<Group> {
        let mut tables = self.tables.write().await;

        if tables.groups.iter().any(|g| g.slug == group.slug) {
            return Err(DbError::Conflict(SLUG_TAKEN.into()));
        }

        tables.groups.push(group.clone());

        Ok(group)
    }

    async fn find_group(&self, group_id: Uuid) -> DbResult<Option<Group>> {
        let tables = self.tables.read().await;

        Ok(tables.groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> DbResult<Option<Group>> {
        let tables = self.tables.read().await;

        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> DbResult<Vec<Group>> {
        let tables = self.tables.read().await;

        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(groups)
    }

    async fn create_post(&self, post: Post) -> DbResult<Post> {
        let mut tables = self.tables.write().await;

        tables.ensure_user(post.author_id)?;

        if let Some(group_id) = post.group_id {
            if !tables.groups.iter().any(|g| g.id == group_id) {
                return Err(DbError::NotFound);
            }
        }

        tables.seq += 1;
        let seq = tables.seq;
        tables.posts.push((seq, post.clone()));

        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> DbResult<Option<PostEntry>> {
        let tables = self.tables.read().await;

        tables
            .posts
            .iter()
            .find(|(_, p)| p.id == post_id)
            .map(|(_, p)| tables.entry(p))
            .transpose()
    }

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> DbResult<Post> {
        let mut tables = self.tables.write().await;

        if let Some(Some(group_id)) = changes.group_id {
            if !tables.groups.iter().any(|g| g.id == group_id) {
                return Err(DbError::NotFound);
            }
        }

        let (_, post) = tables
            .posts
            .iter_mut()
            .find(|(_, p)| p.id == post_id)
            .ok_or(DbError::NotFound)?;

        post.text = changes.text;
        if let Some(group_id) = changes.group_id {
            post.group_id = group_id;
        }
        if let Some(image) = changes.image {
            post.image = Some(image);
        }

        Ok(post.clone())
    }

    async fn delete_post(&self, post_id: Uuid) -> DbResult<Post> {
        let mut tables = self.tables.write().await;

        let index = tables
            .posts
            .iter()
            .position(|(_, p)| p.id == post_id)
            .ok_or(DbError::NotFound)?;

        let (_, post) = tables.posts.remove(index);
        tables.comments.retain(|c| c.post_id != post_id);

        Ok(post)
    }

    async fn count_posts(&self, filter: PostFilter) -> DbResult<i64> {
        let tables = self.tables.read().await;

        let count = tables
            .posts
            .iter()
            .filter(|(_, p)| tables.matches(p, filter))
            .count();

        Ok(count as i64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> DbResult<Vec<PostEntry>> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&(u64, Post)> = tables
            .posts
            .iter()
            .filter(|(_, p)| tables.matches(p, filter))
            .collect();

        // newest first
        posts.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });

        posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, p)| tables.entry(p))
            .collect()
    }

    async fn create_comment(&self, comment: Comment) -> DbResult<Comment> {
        let mut tables = self.tables.write().await;

        tables.ensure_user(comment.author_id)?;

        if !tables.posts.iter().any(|(_, p)| p.id == comment.post_id) {
            return Err(DbError::NotFound);
        }

        tables.comments.push(comment.clone());

        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> DbResult<Vec<(Comment, User)>> {
        let tables = self.tables.read().await;

        let mut comments: Vec<(Comment, User)> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                tables
                    .users
                    .get(&c.author_id)
                    .map(|user| (c.clone(), user.clone()))
            })
            .collect();

        // stable sort keeps insertion order for equal timestamps
        comments.sort_by_key(|(c, _)| c.created_at);

        Ok(comments)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> DbResult<bool> {
        let tables = self.tables.read().await;

        Ok(tables.follows.contains(&Follow { user_id, author_id }))
    }

    async fn create_follow(&self, follow: Follow) -> DbResult<bool> {
        let mut tables = self.tables.write().await;

        if follow.user_id == follow.author_id {
            return Err(DbError::Conflict(SELF_FOLLOW.into()));
        }

        tables.ensure_user(follow.user_id)?;
        tables.ensure_user(follow.author_id)?;

        Ok(tables.follows.insert(follow))
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;

        if tables.follows.remove(&Follow { user_id, author_id }) {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    async fn count_followers(&self, author_id: Uuid) -> DbResult<i64> {
        let tables = self.tables.read().await;

        Ok(tables
            .follows
            .iter()
            .filter(|f| f.author_id == author_id)
            .count() as i64)
    }

    async fn count_following(&self, user_id: Uuid) -> DbResult<i64> {
        let tables = self.tables.read().await;

        Ok(tables
            .follows
            .iter()
            .filter(|f| f.user_id == user_id)
            .count() as i64)
    }
}
