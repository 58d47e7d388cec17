use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{flexible_opt_bool, validate_email_or_blank, validate_phone};
use crate::models::User;

/// Full profile, shown to the account owner and to staff.
#[derive(Debug, Serialize)]
pub struct PrivateUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_patient: bool,
    pub is_doctor: bool,
}

impl From<&User> for PrivateUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            is_patient: user.is_patient,
            is_doctor: user.is_doctor,
        }
    }
}

/// Read-only projection shown to everyone else.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_doctor: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_doctor: user.is_doctor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UserView {
    Private(PrivateUser),
    Public(PublicUser),
}

impl UserView {
    /// Pick the projection `viewer` is allowed to see of `user`.
    pub fn for_viewer(viewer: &User, user: &User) -> Self {
        if viewer.can_manage(user) {
            UserView::Private(user.into())
        } else {
            UserView::Public(user.into())
        }
    }
}

/// Profile update. Absent fields are left alone; a blank `phone` or
/// `address` clears it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 5, max = 150, message = "Username must be between 5 and 150 characters."))]
    pub username: Option<String>,
    #[validate(custom(function = "validate_email_or_blank"))]
    pub email: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_patient: Option<bool>,
    #[serde(default, deserialize_with = "flexible_opt_bool")]
    pub is_doctor: Option<bool>,
}
