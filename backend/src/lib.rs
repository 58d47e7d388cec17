//! Chiron: clinic scheduling backend.
//!
//! Users register as patients and/or doctors, patients book appointments
//! with doctors, and doctors approve or reject them. An approved booking
//! discloses the doctor's phone number to the patient.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod time_utils;

use config::Config;
use db::{DbConn, DbPool};
use error::AppError;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub pool: DbPool,
}

impl AppState {
    pub fn new(config: Config, pool: DbPool) -> Self {
        Self { config, pool }
    }

    /// Check out a pooled connection.
    pub fn conn(&self) -> Result<DbConn, AppError> {
        Ok(self.pool.get()?)
    }
}
