use diesel::{Insertable, Queryable, Selectable};
use uuid::Uuid;

use crate::schema::follows;

/// `user_id` subscribes to the posts of `author_id`.
#[derive(Insertable, Queryable, Selectable, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}
