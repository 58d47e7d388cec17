use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use diesel::sqlite::SqliteConnection;
use validator::Validate;

use super::{
    collect_errors, into_result, message, non_blank,
    user_dtos::{PrivateUser, ProfileUpdateRequest, PublicUser, UserView},
    JsonBody,
};
use crate::{
    auth::CurrentUser,
    error::{AppError, Result},
    models::{user_models::normalize_phone, ProfileChanges, User},
    repositories::UserRepository,
    AppState,
};

pub async fn me(CurrentUser(user): CurrentUser) -> Json<PrivateUser> {
    Json(PrivateUser::from(&user))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<ProfileUpdateRequest>,
) -> Result<Json<PrivateUser>> {
    let mut conn = state.conn()?;
    let updated = apply_profile_update(&mut conn, &user, req)?;
    Ok(Json(PrivateUser::from(&updated)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<UserView>> {
    let mut conn = state.conn()?;
    let user = UserRepository::find_by_username(&mut conn, &username)?.ok_or(AppError::NotFound)?;
    Ok(Json(UserView::for_viewer(&viewer, &user)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(username): Path<String>,
    JsonBody(req): JsonBody<ProfileUpdateRequest>,
) -> Result<Json<PrivateUser>> {
    let mut conn = state.conn()?;
    let target = UserRepository::find_by_username(&mut conn, &username)?.ok_or(AppError::NotFound)?;
    if !caller.can_manage(&target) {
        return Err(AppError::Forbidden);
    }

    let updated = apply_profile_update(&mut conn, &target, req)?;
    if caller.id != target.id {
        tracing::info!(staff_id = caller.id, user_id = target.id, "Profile updated by staff");
    }
    Ok(Json(PrivateUser::from(&updated)))
}

/// Every doctor, in the public projection. Open to anonymous callers.
pub async fn doctors(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PublicUser>>> {
    let mut conn = state.conn()?;
    let doctors = UserRepository::doctors(&mut conn)?;
    Ok(Json(doctors.iter().map(PublicUser::from).collect()))
}

fn apply_profile_update(
    conn: &mut SqliteConnection,
    target: &User,
    req: ProfileUpdateRequest,
) -> Result<User> {
    let mut errors = collect_errors(req.validate());

    if let Some(username) = req.username.as_deref() {
        if UserRepository::username_taken(conn, username, Some(target.id))? {
            errors.add(
                "username",
                message("unique", "A user with that username already exists."),
            );
        }
    }

    // Some("") clears the number, an invalid one was already reported.
    let phone = req.phone.map(|raw| non_blank(Some(raw)).and_then(|p| normalize_phone(&p)));
    if let Some(Some(number)) = phone.as_ref() {
        if UserRepository::phone_taken(conn, number, Some(target.id))? {
            errors.add(
                "phone",
                message("unique", "User with this phone number already exists."),
            );
        }
    }
    into_result(errors)?;

    let changes = ProfileChanges {
        username: req.username,
        email: req.email.map(|e| e.trim().to_string()),
        first_name: req.first_name.map(|n| n.trim().to_string()),
        last_name: req.last_name.map(|n| n.trim().to_string()),
        phone,
        address: req.address.map(|a| non_blank(Some(a))),
        is_doctor: req.is_doctor,
        is_patient: req.is_patient,
    };
    let updated = UserRepository::update_profile(conn, target.id, &changes)?;

    tracing::debug!(user_id = updated.id, "Profile updated");
    Ok(updated)
}
