use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;

use crate::{
    models::token_models::{AuthToken, NewAuthToken},
    schema::tokens,
};

pub struct TokenRepository;

impl TokenRepository {
    pub fn find_by_key(conn: &mut SqliteConnection, key: &str) -> Result<Option<AuthToken>, DieselError> {
        tokens::table
            .find(key)
            .select(AuthToken::as_select())
            .first(conn)
            .optional()
    }

    /// Return the user's token, creating one on first use.
    pub fn get_or_create(
        conn: &mut SqliteConnection,
        user_id: i32,
        now: NaiveDateTime,
    ) -> Result<AuthToken, DieselError> {
        conn.transaction(|conn| {
            let existing = tokens::table
                .filter(tokens::user_id.eq(user_id))
                .select(AuthToken::as_select())
                .first(conn)
                .optional()?;
            if let Some(token) = existing {
                return Ok(token);
            }

            let new_token = NewAuthToken::generate(user_id, now);
            diesel::insert_into(tokens::table)
                .values(&new_token)
                .execute(conn)?;
            tokens::table
                .find(&new_token.key)
                .select(AuthToken::as_select())
                .first(conn)
        })
    }

    pub fn delete_for_user(conn: &mut SqliteConnection, user_id: i32) -> Result<usize, DieselError> {
        diesel::delete(tokens::table.filter(tokens::user_id.eq(user_id))).execute(conn)
    }
}
