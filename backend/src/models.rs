//! Database row types and the domain rules attached to them.

pub mod appointment_models;
pub mod token_models;
pub mod user_models;

pub use appointment_models::{
    Appointment, AppointmentChanges, AppointmentRole, ApprovalDecision, NewAppointment,
};
pub use token_models::{AuthToken, NewAuthToken};
pub use user_models::{NewUser, ProfileChanges, User};
