use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;

use crate::{
    models::appointment_models::{Appointment, AppointmentChanges, NewAppointment},
    schema::appointments,
};

pub struct AppointmentRepository;

impl AppointmentRepository {
    pub fn create(
        conn: &mut SqliteConnection,
        new_appointment: &NewAppointment,
    ) -> Result<Appointment, DieselError> {
        conn.transaction(|conn| {
            diesel::insert_into(appointments::table)
                .values(new_appointment)
                .execute(conn)?;
            appointments::table
                .order(appointments::id.desc())
                .select(Appointment::as_select())
                .first(conn)
        })
    }

    /// Unscoped lookup, used by the doctor/patient actions which report
    /// ownership failures themselves.
    pub fn find(conn: &mut SqliteConnection, appointment_id: i32) -> Result<Option<Appointment>, DieselError> {
        appointments::table
            .find(appointment_id)
            .select(Appointment::as_select())
            .first(conn)
            .optional()
    }

    /// Lookup restricted to appointments where `user_id` is doctor or patient.
    pub fn find_involving(
        conn: &mut SqliteConnection,
        appointment_id: i32,
        user_id: i32,
    ) -> Result<Option<Appointment>, DieselError> {
        appointments::table
            .find(appointment_id)
            .filter(
                appointments::doctor_id
                    .eq(user_id)
                    .or(appointments::patient_id.eq(user_id)),
            )
            .select(Appointment::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_involving(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<Appointment>, DieselError> {
        appointments::table
            .filter(
                appointments::doctor_id
                    .eq(user_id)
                    .or(appointments::patient_id.eq(user_id)),
            )
            .order((appointments::date.asc(), appointments::id.asc()))
            .select(Appointment::as_select())
            .load(conn)
    }

    pub fn update(
        conn: &mut SqliteConnection,
        appointment_id: i32,
        changes: &AppointmentChanges,
    ) -> Result<Appointment, DieselError> {
        diesel::update(appointments::table.find(appointment_id))
            .set(changes)
            .execute(conn)?;
        appointments::table
            .find(appointment_id)
            .select(Appointment::as_select())
            .first(conn)
    }

    pub fn set_approved(
        conn: &mut SqliteConnection,
        appointment_id: i32,
        approved: bool,
    ) -> Result<(), DieselError> {
        diesel::update(appointments::table.find(appointment_id))
            .set(appointments::approved.eq(approved))
            .execute(conn)?;
        Ok(())
    }

    pub fn delete(conn: &mut SqliteConnection, appointment_id: i32) -> Result<usize, DieselError> {
        diesel::delete(appointments::table.find(appointment_id)).execute(conn)
    }
}
