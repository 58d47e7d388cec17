use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::sqlite::SqliteConnection;
use validator::ValidationErrors;

use super::{
    appointment_dtos::{AppointmentRequest, AppointmentView, BookingView, ContactView},
    into_result, message, JsonBody,
};
use crate::{
    auth::CurrentUser,
    error::{AppError, Result},
    models::{Appointment, AppointmentChanges, ApprovalDecision, NewAppointment, User},
    repositories::{AppointmentRepository, UserRepository},
    time_utils::parse_datetime,
    AppState,
};

/// A booking request after validation.
struct Booking {
    doctor: User,
    /// `None` keeps the current description, `Some(None)` clears it.
    description: Option<Option<String>>,
    date: Option<NaiveDateTime>,
}

/// Validate a create/update body for `patient`. With `partial`, a missing
/// `doctor` or `date` means "unchanged" and `current_doctor` is used.
fn validate_booking(
    conn: &mut SqliteConnection,
    patient: &User,
    req: AppointmentRequest,
    partial: bool,
    current_doctor: Option<i32>,
) -> Result<Booking> {
    let mut errors = ValidationErrors::new();

    let doctor_name = req.doctor.map(|d| d.trim().to_string());
    match doctor_name.as_deref() {
        Some("") => errors.add("doctor", message("blank", "This field may not be blank.")),
        None if !partial => errors.add("doctor", message("required", "This field is required.")),
        _ => {}
    }

    let date = match req.date.as_deref() {
        Some(raw) => {
            let parsed = parse_datetime(raw);
            if parsed.is_none() {
                errors.add(
                    "date",
                    message(
                        "invalid",
                        "Datetime has wrong format. Use one of these formats instead: \
                         YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].",
                    ),
                );
            }
            parsed
        }
        None if !partial => {
            errors.add("date", message("required", "This field is required."));
            None
        }
        None => None,
    };
    into_result(errors)?;

    if !patient.is_patient {
        return Err(AppError::non_field("mentioned user for patient is not a patient"));
    }

    let doctor = match doctor_name.as_deref() {
        Some(name) => UserRepository::find_by_username(conn, name)?
            .ok_or_else(|| AppError::non_field("mentioned user for doctor does not exist"))?,
        None => {
            let id = current_doctor.ok_or(AppError::NotFound)?;
            UserRepository::find_by_id(conn, id)?.ok_or(AppError::NotFound)?
        }
    };
    if !doctor.is_doctor {
        return Err(AppError::non_field("mentioned user for doctor is not a doctor"));
    }

    Ok(Booking {
        doctor,
        description: req.description.map(|d| Some(d).filter(|d| !d.trim().is_empty())),
        date,
    })
}

/// Render appointments with participant usernames resolved in one query.
fn render(conn: &mut SqliteConnection, appointments: &[Appointment]) -> Result<Vec<AppointmentView>> {
    let ids: Vec<i32> = appointments
        .iter()
        .flat_map(|a| [a.patient_id, a.doctor_id])
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let names = UserRepository::usernames(conn, &ids)?;
    let name = |id: i32| names.get(&id).cloned().unwrap_or_default();

    Ok(appointments
        .iter()
        .map(|a| AppointmentView::new(a, name(a.patient_id), name(a.doctor_id)))
        .collect())
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<AppointmentView>>> {
    let mut conn = state.conn()?;
    let appointments = AppointmentRepository::list_involving(&mut conn, user.id)?;
    Ok(Json(render(&mut conn, &appointments)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(patient): CurrentUser,
    JsonBody(req): JsonBody<AppointmentRequest>,
) -> Result<(StatusCode, Json<BookingView>)> {
    let mut conn = state.conn()?;
    let booking = validate_booking(&mut conn, &patient, req, false, None)?;
    let date = booking
        .date
        .ok_or_else(|| AppError::Internal("validated booking without a date".to_string()))?;

    let appointment = AppointmentRepository::create(
        &mut conn,
        &NewAppointment {
            patient_id: patient.id,
            doctor_id: booking.doctor.id,
            description: booking.description.flatten(),
            date,
            date_created: Utc::now().naive_utc(),
        },
    )?;

    tracing::info!(
        appointment_id = appointment.id,
        patient_id = patient.id,
        doctor_id = booking.doctor.id,
        "Appointment requested"
    );
    Ok((
        StatusCode::CREATED,
        Json(BookingView::new(&appointment, booking.doctor.username)),
    ))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<AppointmentView>> {
    let mut conn = state.conn()?;
    let appointment =
        AppointmentRepository::find_involving(&mut conn, id, user.id)?.ok_or(AppError::NotFound)?;
    let mut views = render(&mut conn, std::slice::from_ref(&appointment))?;
    views.pop().map(Json).ok_or(AppError::NotFound)
}

/// Full replacement: `doctor` and `date` are required.
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<AppointmentRequest>,
) -> Result<Json<BookingView>> {
    apply_update(&state, &user, id, req, false).map(Json)
}

pub async fn partial_update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<AppointmentRequest>,
) -> Result<Json<BookingView>> {
    apply_update(&state, &user, id, req, true).map(Json)
}

fn apply_update(
    state: &AppState,
    user: &User,
    id: i32,
    req: AppointmentRequest,
    partial: bool,
) -> Result<BookingView> {
    let mut conn = state.conn()?;
    let appointment =
        AppointmentRepository::find_involving(&mut conn, id, user.id)?.ok_or(AppError::NotFound)?;
    if !appointment.can_edit(user.id) {
        return Err(AppError::NotOwner);
    }

    let booking = validate_booking(&mut conn, user, req, partial, Some(appointment.doctor_id))?;
    let changes = AppointmentChanges {
        doctor_id: booking.doctor.id,
        approved: appointment.approval_after_reassign(booking.doctor.id),
        description: booking.description.unwrap_or(appointment.description),
        date: booking.date.unwrap_or(appointment.date),
    };
    let updated = AppointmentRepository::update(&mut conn, id, &changes)?;

    tracing::info!(appointment_id = id, patient_id = user.id, "Appointment updated");
    Ok(BookingView::new(&updated, booking.doctor.username))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let mut conn = state.conn()?;
    let appointment =
        AppointmentRepository::find_involving(&mut conn, id, user.id)?.ok_or(AppError::NotFound)?;
    if !appointment.can_edit(user.id) {
        return Err(AppError::NotOwner);
    }

    AppointmentRepository::delete(&mut conn, id)?;
    tracing::info!(appointment_id = id, patient_id = user.id, "Appointment cancelled");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    decide(&state, &user, id, ApprovalDecision::Approve)
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    decide(&state, &user, id, ApprovalDecision::Reject)
}

fn decide(state: &AppState, user: &User, id: i32, decision: ApprovalDecision) -> Result<StatusCode> {
    let mut conn = state.conn()?;
    let appointment = AppointmentRepository::find(&mut conn, id)?.ok_or(AppError::NotFound)?;
    if !appointment.can_decide(user.id) {
        tracing::debug!(appointment_id = id, user_id = user.id, "Decision refused");
        return Err(AppError::NotOwner);
    }

    AppointmentRepository::set_approved(&mut conn, id, decision.approved())?;
    tracing::info!(
        appointment_id = id,
        doctor_id = user.id,
        decision = decision.as_str(),
        "Appointment decided"
    );
    Ok(StatusCode::ACCEPTED)
}

/// The doctor's phone number, for the patient of an approved booking.
pub async fn visit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ContactView>)> {
    let mut conn = state.conn()?;
    let appointment = AppointmentRepository::find(&mut conn, id)?.ok_or(AppError::NotFound)?;
    if !appointment.contact_visible_to(user.id) {
        return Err(AppError::NotOwner);
    }

    let doctor = UserRepository::find_by_id(&mut conn, appointment.doctor_id)?.ok_or(AppError::NotFound)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ContactView {
            phone_number: doctor.phone,
        }),
    ))
}
