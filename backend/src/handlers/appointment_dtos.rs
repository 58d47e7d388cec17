use serde::{Deserialize, Serialize};

use crate::models::Appointment;
use crate::time_utils::format_utc_rfc3339;

/// Body of create and update requests. `approved` is not accepted here;
/// only the doctor's approve/reject actions change it.
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentRequest {
    #[serde(default)]
    pub doctor: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Full appointment as seen by its doctor or patient.
#[derive(Debug, Serialize)]
pub struct AppointmentView {
    pub id: i32,
    pub patient: String,
    pub doctor: String,
    pub description: Option<String>,
    pub date: String,
    pub date_created: String,
    pub approved: bool,
}

impl AppointmentView {
    pub fn new(appointment: &Appointment, patient: String, doctor: String) -> Self {
        Self {
            id: appointment.id,
            patient,
            doctor,
            description: appointment.description.clone(),
            date: format_utc_rfc3339(appointment.date),
            date_created: format_utc_rfc3339(appointment.date_created),
            approved: appointment.approved,
        }
    }
}

/// Response to create/update: what the patient submitted.
#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: i32,
    pub doctor: String,
    pub description: Option<String>,
    pub date: String,
}

impl BookingView {
    pub fn new(appointment: &Appointment, doctor: String) -> Self {
        Self {
            id: appointment.id,
            doctor,
            description: appointment.description.clone(),
            date: format_utc_rfc3339(appointment.date),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactView {
    pub phone_number: Option<String>,
}
