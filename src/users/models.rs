use std::io::Write;

use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    serialize::{self, IsNull, Output, ToSql},
    AsExpression, FromSqlRow, Identifiable, Insertable, Queryable, Selectable,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{common::models::FormErrors, posts::models::PostsPage, schema::users};

/// Ordered from least to most privileged.
#[derive(
    Deserialize, Serialize, Debug, AsExpression, FromSqlRow, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ToSchema,
)]
#[diesel(sql_type = crate::schema::sql_types::Userrole)]
#[repr(u32)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User = 0,
    Staff = 1,
    Admin = 2,
}

impl UserRole {
    pub const fn from_repr(repr: u32) -> Option<Self> {
        match repr {
            0 => Some(UserRole::User),
            1 => Some(UserRole::Staff),
            2 => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Whether a user with this role may act where `required` is needed.
    pub fn satisfies(self, required: UserRole) -> bool {
        self >= required
    }
}

impl ToSql<crate::schema::sql_types::Userrole, Pg> for UserRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            UserRole::User => out.write_all(b"user"),
            UserRole::Staff => out.write_all(b"staff"),
            UserRole::Admin => out.write_all(b"admin"),
        }?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::Userrole, Pg> for UserRole {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"user" => Ok(UserRole::User),
            b"staff" => Ok(UserRole::Staff),
            b"admin" => Ok(UserRole::Admin),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(Insertable, Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn into_response_brief(self) -> UserResponseBrief {
        UserResponseBrief {
            id: self.id,
            username: self.username,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponseBrief {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

#[derive(Validate, Deserialize, ToSchema)]
pub struct SignUp {
    #[garde(length(min = 3, max = 150), custom(username_characters))]
    pub username: String,
    #[garde(length(min = 8))]
    pub password: String,
}

fn username_characters(value: &str, _: &()) -> garde::Result {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        Err(garde::Error::new(
            "may contain only letters, numbers, and @/./+/-/_ characters",
        ))
    }
}

#[derive(Deserialize, ToSchema)]
pub struct Login {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginParams {
    pub next: Option<String>,
}

/// Login form document, also used when signing up fails.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginPage {
    pub next: Option<String>,
    pub username: Option<String>,
    pub errors: FormErrors,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub author: UserResponseBrief,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
    /// Whether the requesting user follows this author.
    pub following: bool,
    pub page: PostsPage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_ordered_by_privilege() {
        assert!(UserRole::Admin.satisfies(UserRole::Staff));
        assert!(UserRole::Staff.satisfies(UserRole::Staff));
        assert!(UserRole::Staff.satisfies(UserRole::User));
        assert!(!UserRole::User.satisfies(UserRole::Staff));
        assert!(!UserRole::Staff.satisfies(UserRole::Admin));
    }

    #[test]
    fn role_reprs_map_back_to_variants() {
        for role in [UserRole::User, UserRole::Staff, UserRole::Admin] {
            assert_eq!(UserRole::from_repr(role as u32), Some(role));
        }
        assert_eq!(UserRole::from_repr(3), None);
    }

    #[test]
    fn signup_rejects_bad_usernames() {
        let signup = |username: &str| SignUp {
            username: username.to_string(),
            password: String::from("long enough"),
        };

        assert!(signup("leo.tolstoy+1@ya").validate(&()).is_ok());
        assert!(signup("le").validate(&()).is_err());
        assert!(signup("has space").validate(&()).is_err());
        assert!(signup("лев").validate(&()).is_err());
    }

    #[test]
    fn signup_rejects_short_passwords() {
        let signup = SignUp {
            username: String::from("leo"),
            password: String::from("short"),
        };

        assert!(signup.validate(&()).is_err());
    }
}
