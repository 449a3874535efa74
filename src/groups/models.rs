use std::fmt;

use diesel::{Identifiable, Insertable, Queryable, Selectable};
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{posts::models::PostsPage, schema::groups};

#[derive(Insertable, Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl Group {
    pub fn into_response(self) -> GroupResponse {
        GroupResponse {
            id: self.id,
            title: self.title,
            slug: self.slug,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GroupResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupPageResponse {
    pub group: GroupResponse,
    pub page: PostsPage,
}

#[derive(Debug, Validate, Deserialize, ToSchema)]
pub struct CreateGroup {
    #[garde(length(min = 1, max = 200))]
    pub title: String,
    /// Derived from the title when omitted.
    #[garde(length(max = 50))]
    pub slug: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub description: String,
}
