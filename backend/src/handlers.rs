//! HTTP handlers and their request/response shapes.

pub mod appointment_dtos;
pub mod appointment_handlers;
pub mod auth_dtos;
pub mod auth_handlers;
pub mod user_dtos;
pub mod user_handlers;

use std::borrow::Cow;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest},
    http::Request,
    Json,
};
use serde::{de, Deserialize, Deserializer};
use validator::{ValidateEmail, ValidationError, ValidationErrors};

use crate::{error::AppError, models::user_models::normalize_phone};

/// JSON body extractor whose rejections render as `AppError::BadRequest`.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for JsonBody<T>
where
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = AppError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Start a fresh error set from a derive-level validation result.
pub(crate) fn collect_errors(result: Result<(), ValidationErrors>) -> ValidationErrors {
    result.err().unwrap_or_default()
}

pub(crate) fn message(code: &'static str, text: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(text.into());
    error
}

pub(crate) fn into_result(errors: ValidationErrors) -> Result<(), AppError> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// `None` for absent or whitespace-only input.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.trim().is_empty() || normalize_phone(phone).is_some() {
        Ok(())
    } else {
        Err(message(
            "invalid_phone",
            "Enter a valid phone number in international format (e.g. +12125552368).",
        ))
    }
}

pub(crate) fn validate_email_or_blank(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || email.trim().validate_email() {
        Ok(())
    } else {
        Err(message("invalid_email", "Enter a valid email address."))
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn bool_like<E: de::Error>(value: BoolLike) -> Result<bool, E> {
    match value {
        BoolLike::Bool(b) => Ok(b),
        BoolLike::Int(0) => Ok(false),
        BoolLike::Int(1) => Ok(true),
        BoolLike::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(E::custom("Must be a valid boolean.")),
        },
        BoolLike::Int(_) => Err(E::custom("Must be a valid boolean.")),
    }
}

/// Accept JSON booleans, `0`/`1` and common string spellings.
pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    bool_like(BoolLike::deserialize(deserializer)?)
}

pub(crate) fn flexible_opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BoolLike>::deserialize(deserializer)?
        .map(bool_like)
        .transpose()
}
