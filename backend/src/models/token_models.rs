use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::tokens;

/// Server-side record of an issued credential. The JWT handed to the
/// client carries `key` as its `jti`.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = tokens)]
#[diesel(primary_key(key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuthToken {
    pub key: String,
    pub user_id: i32,
    pub created: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tokens)]
pub struct NewAuthToken {
    pub key: String,
    pub user_id: i32,
    pub created: NaiveDateTime,
}

impl NewAuthToken {
    pub fn generate(user_id: i32, created: NaiveDateTime) -> Self {
        Self {
            key: uuid::Uuid::new_v4().simple().to_string(),
            user_id,
            created,
        }
    }
}
