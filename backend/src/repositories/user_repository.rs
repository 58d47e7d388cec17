use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;

use crate::{
    models::user_models::{NewUser, ProfileChanges, User},
    schema::users,
};

pub struct UserRepository;

impl UserRepository {
    pub fn find_by_id(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<User>, DieselError> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_username(
        conn: &mut SqliteConnection,
        search_username: &str,
    ) -> Result<Option<User>, DieselError> {
        users::table
            .filter(users::username.eq(search_username))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    /// Whether `username` belongs to someone other than `except`.
    pub fn username_taken(
        conn: &mut SqliteConnection,
        username: &str,
        except: Option<i32>,
    ) -> Result<bool, DieselError> {
        let existing: Option<i32> = users::table
            .filter(users::username.eq(username))
            .select(users::id)
            .first(conn)
            .optional()?;
        Ok(matches!(existing, Some(id) if Some(id) != except))
    }

    /// Whether `phone` belongs to someone other than `except`.
    pub fn phone_taken(
        conn: &mut SqliteConnection,
        phone: &str,
        except: Option<i32>,
    ) -> Result<bool, DieselError> {
        let existing: Option<i32> = users::table
            .filter(users::phone.eq(phone))
            .select(users::id)
            .first(conn)
            .optional()?;
        Ok(matches!(existing, Some(id) if Some(id) != except))
    }

    pub fn create(conn: &mut SqliteConnection, new_user: &NewUser) -> Result<User, DieselError> {
        conn.transaction(|conn| {
            diesel::insert_into(users::table)
                .values(new_user)
                .execute(conn)?;
            users::table
                .filter(users::username.eq(&new_user.username))
                .select(User::as_select())
                .first(conn)
        })
    }

    pub fn update_profile(
        conn: &mut SqliteConnection,
        user_id: i32,
        changes: &ProfileChanges,
    ) -> Result<User, DieselError> {
        if !changes.is_empty() {
            diesel::update(users::table.find(user_id))
                .set(changes)
                .execute(conn)?;
        }
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(conn)
    }

    pub fn set_password_hash(
        conn: &mut SqliteConnection,
        user_id: i32,
        hash: &str,
    ) -> Result<(), DieselError> {
        diesel::update(users::table.find(user_id))
            .set(users::password_hash.eq(hash))
            .execute(conn)?;
        Ok(())
    }

    pub fn touch_last_login(
        conn: &mut SqliteConnection,
        user_id: i32,
        at: NaiveDateTime,
    ) -> Result<(), DieselError> {
        diesel::update(users::table.find(user_id))
            .set(users::last_login.eq(Some(at)))
            .execute(conn)?;
        Ok(())
    }

    pub fn doctors(conn: &mut SqliteConnection) -> Result<Vec<User>, DieselError> {
        users::table
            .filter(users::is_doctor.eq(true))
            .order(users::username.asc())
            .select(User::as_select())
            .load(conn)
    }

    /// Map user ids to usernames for rendering appointments.
    pub fn usernames(
        conn: &mut SqliteConnection,
        ids: &[i32],
    ) -> Result<HashMap<i32, String>, DieselError> {
        let rows: Vec<(i32, String)> = users::table
            .filter(users::id.eq_any(ids))
            .select((users::id, users::username))
            .load(conn)?;
        Ok(rows.into_iter().collect())
    }

    #[cfg(test)]
    pub fn delete(conn: &mut SqliteConnection, user_id: i32) -> Result<usize, DieselError> {
        diesel::delete(users::table.find(user_id)).execute(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{conn, insert_user};

    #[test]
    fn test_find_by_username_matches_exactly() {
        let mut conn = conn();
        let alice = insert_user(&mut conn, "alice_doc", true);
        insert_user(&mut conn, "bobby_pat", false);

        let found = UserRepository::find_by_username(&mut conn, "alice_doc").unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(UserRepository::find_by_username(&mut conn, "nobody")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_username_taken_ignores_self() {
        let mut conn = conn();
        let alice = insert_user(&mut conn, "alice_doc", true);

        assert!(UserRepository::username_taken(&mut conn, "alice_doc", None).unwrap());
        assert!(!UserRepository::username_taken(&mut conn, "alice_doc", Some(alice.id)).unwrap());
    }

    #[test]
    fn test_doctors_only_lists_doctors() {
        let mut conn = conn();
        insert_user(&mut conn, "zed_doctor", true);
        insert_user(&mut conn, "amy_doctor", true);
        insert_user(&mut conn, "pat_patient", false);

        let names: Vec<String> = UserRepository::doctors(&mut conn)
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["amy_doctor", "zed_doctor"]);
    }

    #[test]
    fn test_update_profile_clears_nullable_column() {
        let mut conn = conn();
        let user = insert_user(&mut conn, "alice_doc", true);
        let with_phone = UserRepository::update_profile(
            &mut conn,
            user.id,
            &ProfileChanges {
                phone: Some(Some("+15550102030".to_string())),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(with_phone.phone.as_deref(), Some("+15550102030"));

        let cleared = UserRepository::update_profile(
            &mut conn,
            user.id,
            &ProfileChanges {
                phone: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cleared.phone, None);
    }
}
