use std::sync::Arc;

use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use validator::Validate;

use super::{
    auth_dtos::{ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    collect_errors, into_result, message, non_blank,
    user_dtos::PrivateUser,
    JsonBody,
};
use crate::{
    auth::{self, CurrentUser},
    error::{AppError, Result},
    models::{user_models::normalize_phone, NewUser},
    repositories::{TokenRepository, UserRepository},
    AppState,
};

pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<PrivateUser>)> {
    let mut errors = collect_errors(req.validate());
    if req.password != req.confirm_password {
        errors.add(
            "password_mismatch",
            message("password_mismatch", "The two password fields didn't match."),
        );
    }
    let phone = non_blank(req.phone).and_then(|p| normalize_phone(&p));

    let mut conn = state.conn()?;
    if UserRepository::username_taken(&mut conn, &req.username, None)? {
        errors.add(
            "username",
            message("unique", "A user with that username already exists."),
        );
    }
    if let Some(phone) = phone.as_deref() {
        if UserRepository::phone_taken(&mut conn, phone, None)? {
            errors.add(
                "phone",
                message("unique", "User with this phone number already exists."),
            );
        }
    }
    into_result(errors)?;

    let password_hash = auth::hash_password(&req.password, state.config.bcrypt_cost)?;
    let user = UserRepository::create(
        &mut conn,
        &NewUser {
            username: req.username,
            password_hash,
            email: non_blank(req.email).unwrap_or_default(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            phone,
            address: non_blank(req.address),
            is_doctor: req.is_doctor,
            is_patient: req.is_patient,
            // Pending e-mail activation.
            is_active: false,
            date_joined: Utc::now().naive_utc(),
        },
    )?;

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        is_doctor = user.is_doctor,
        is_patient = user.is_patient,
        "User registered"
    );
    Ok((StatusCode::CREATED, Json(PrivateUser::from(&user))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let mut conn = state.conn()?;
    let user = UserRepository::find_by_username(&mut conn, &req.username)?
        .filter(|user| auth::verify_password(&req.password, &user.password_hash))
        .filter(|user| user.is_active || !state.config.require_activation)
        .ok_or_else(|| {
            tracing::info!(username = %req.username, "Login rejected");
            AppError::non_field("Unable to log in with provided credentials.")
        })?;

    let now = Utc::now().naive_utc();
    let token = TokenRepository::get_or_create(&mut conn, user.id, now)?;
    UserRepository::touch_last_login(&mut conn, user.id, now)?;
    let access_token = auth::issue_token(&token, &state.config)?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok((
        [(header::SET_COOKIE, auth::session_cookie(&access_token, &state.config))],
        Json(LoginResponse {
            token: access_token,
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    let mut conn = state.conn()?;
    if TokenRepository::delete_for_user(&mut conn, user.id)? == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = user.id, "User logged out");
    Ok((
        StatusCode::ACCEPTED,
        [(header::SET_COOKIE, auth::expired_session_cookie(&state.config))],
    ))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    req.validate()?;

    if !auth::verify_password(&req.old_password, &user.password_hash) {
        return Err(AppError::field("old_password", "wrong_password", "Wrong password."));
    }
    if req.new_password != req.confirm_new_password {
        return Err(AppError::field(
            "new_password",
            "password_mismatch",
            "New passwords must match",
        ));
    }

    let password_hash = auth::hash_password(&req.new_password, state.config.bcrypt_cost)?;
    let mut conn = state.conn()?;
    UserRepository::set_password_hash(&mut conn, user.id, &password_hash)?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(Json(MessageResponse {
        response: "successfully changed password".to_string(),
    }))
}
