//! Query functions, one repository per table.

pub mod appointment_repository;
pub mod token_repository;
pub mod user_repository;

pub use appointment_repository::AppointmentRepository;
pub use token_repository::TokenRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use diesel::sqlite::SqliteConnection;

    use super::UserRepository;
    use crate::db::{self, DbConn};
    use crate::models::{NewUser, User};

    pub fn conn() -> DbConn {
        let pool = db::connect(":memory:", 1).expect("in-memory pool");
        pool.get().expect("connection")
    }

    pub fn insert_user(conn: &mut SqliteConnection, username: &str, is_doctor: bool) -> User {
        UserRepository::create(
            conn,
            &NewUser {
                username: username.to_string(),
                password_hash: "x".to_string(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                phone: None,
                address: None,
                is_doctor,
                is_patient: !is_doctor,
                is_active: true,
                date_joined: Utc::now().naive_utc(),
            },
        )
        .expect("insert user")
    }
}
