use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{default_true, flexible_bool, validate_email_or_blank, validate_phone};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 5, max = 150, message = "Username must be between 5 and 150 characters."))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub confirm_password: String,
    #[serde(default)]
    #[validate(custom(function = "validate_email_or_blank"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[serde(default = "default_true", deserialize_with = "flexible_bool")]
    pub is_patient: bool,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_doctor: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub old_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub new_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub confirm_new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub response: String,
}
