//! Application error type and its JSON rendering.

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::{ValidationError, ValidationErrors};

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    /// The caller is involved in the resource but not in the role the
    /// action requires. Rendered as a bare 400.
    #[error("Caller does not own this resource")]
    NotOwner,

    #[error("Authentication credentials were not provided")]
    Unauthorized,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User inactive or deleted")]
    InactiveAccount,

    #[error("Permission denied")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// A single validation message attached to `field`.
    pub fn field(field: &'static str, code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());

        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        AppError::Validation(errors)
    }

    /// A validation message that is not tied to one field.
    pub fn non_field(message: impl Into<Cow<'static, str>>) -> Self {
        Self::field(NON_FIELD_ERRORS, "invalid", message)
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::NotFound => AppError::NotFound,
            // Lost a race against a concurrent insert of the same username/phone.
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::non_field("A record with these details already exists.")
            }
            other => AppError::Database(other),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {err}"))
    }
}

/// Flatten validator output into `{"field": ["message", ...]}`.
fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value ({}).", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(field_messages(errors))).into_response()
            }
            AppError::BadRequest(msg) => detail(StatusCode::BAD_REQUEST, msg),
            AppError::NotOwner => StatusCode::BAD_REQUEST.into_response(),
            AppError::Unauthorized => detail(
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            AppError::InvalidToken => detail(StatusCode::UNAUTHORIZED, "Invalid token."),
            AppError::InactiveAccount => {
                detail(StatusCode::UNAUTHORIZED, "User inactive or deleted.")
            }
            AppError::Forbidden => detail(
                StatusCode::FORBIDDEN,
                "You do not have permission to perform this action.",
            ),
            AppError::NotFound => detail(StatusCode::NOT_FOUND, "Not found."),
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "A server error occurred.")
            }
        }
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diesel_not_found_maps_to_404() {
        let response = AppError::from(diesel::result::Error::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_field_error_collects_message() {
        let AppError::Validation(errors) =
            AppError::field("old_password", "wrong_password", "Wrong password.")
        else {
            panic!("expected a validation error");
        };
        let messages = field_messages(&errors);
        assert_eq!(messages["old_password"], vec!["Wrong password.".to_string()]);
    }

    #[test]
    fn test_not_owner_is_bare_bad_request() {
        let response = AppError::NotOwner.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
