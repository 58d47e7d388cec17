use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::appointments;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Appointment {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub date_created: NaiveDateTime,
    pub approved: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub date_created: NaiveDateTime,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = appointments)]
#[diesel(treat_none_as_null = true)]
pub struct AppointmentChanges {
    pub doctor_id: i32,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub approved: bool,
}

/// The part a user plays in an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentRole {
    Doctor,
    Patient,
}

/// A doctor's ruling on a booking. Both transitions are always available,
/// so a decision can be reversed any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

impl ApprovalDecision {
    pub fn approved(self) -> bool {
        matches!(self, ApprovalDecision::Approve)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalDecision::Approve => "approve",
            ApprovalDecision::Reject => "reject",
        }
    }
}

impl Appointment {
    /// Roles `user_id` holds on this appointment. A user booking themselves
    /// holds both.
    pub fn roles_of(&self, user_id: i32) -> Vec<AppointmentRole> {
        let mut roles = Vec::with_capacity(2);
        if self.doctor_id == user_id {
            roles.push(AppointmentRole::Doctor);
        }
        if self.patient_id == user_id {
            roles.push(AppointmentRole::Patient);
        }
        roles
    }

    pub fn has_role(&self, user_id: i32, role: AppointmentRole) -> bool {
        self.roles_of(user_id).contains(&role)
    }

    /// Only the assigned doctor may rule on the booking.
    pub fn can_decide(&self, user_id: i32) -> bool {
        self.has_role(user_id, AppointmentRole::Doctor)
    }

    /// Only the booking patient may edit or cancel it.
    pub fn can_edit(&self, user_id: i32) -> bool {
        self.has_role(user_id, AppointmentRole::Patient)
    }

    /// The doctor's contact details are released to the patient once approved.
    pub fn contact_visible_to(&self, user_id: i32) -> bool {
        self.approved && self.has_role(user_id, AppointmentRole::Patient)
    }

    /// Approval after the booking is reassigned to `doctor_id`. A decision
    /// belongs to the doctor who made it, so a new doctor starts pending.
    pub fn approval_after_reassign(&self, doctor_id: i32) -> bool {
        self.approved && self.doctor_id == doctor_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DOCTOR: i32 = 1;
    const PATIENT: i32 = 2;
    const STRANGER: i32 = 3;

    fn appointment(approved: bool) -> Appointment {
        let date = NaiveDate::from_ymd_opt(2021, 2, 15)
            .unwrap()
            .and_hms_opt(22, 21, 0)
            .unwrap();
        Appointment {
            id: 1,
            patient_id: PATIENT,
            doctor_id: DOCTOR,
            description: None,
            date,
            date_created: date,
            approved,
        }
    }

    #[test]
    fn test_only_the_doctor_can_decide() {
        let appt = appointment(false);
        assert!(appt.can_decide(DOCTOR));
        assert!(!appt.can_decide(PATIENT));
        assert!(!appt.can_decide(STRANGER));
    }

    #[test]
    fn test_contact_requires_approval_and_patient() {
        assert!(!appointment(false).contact_visible_to(PATIENT));
        assert!(appointment(true).contact_visible_to(PATIENT));
        assert!(!appointment(true).contact_visible_to(DOCTOR));
        assert!(!appointment(true).contact_visible_to(STRANGER));
    }

    #[test]
    fn test_self_booking_holds_both_roles() {
        let mut appt = appointment(false);
        appt.patient_id = DOCTOR;
        assert_eq!(
            appt.roles_of(DOCTOR),
            vec![AppointmentRole::Doctor, AppointmentRole::Patient]
        );
        assert!(appt.can_edit(DOCTOR) && appt.can_decide(DOCTOR));
        assert!(appt.roles_of(PATIENT).is_empty());
    }

    #[test]
    fn test_reassigning_the_doctor_resets_approval() {
        let appt = appointment(true);
        assert!(appt.approval_after_reassign(DOCTOR));
        assert!(!appt.approval_after_reassign(STRANGER));
        assert!(!appointment(false).approval_after_reassign(DOCTOR));
    }

    #[test]
    fn test_decisions_map_to_flag() {
        assert!(ApprovalDecision::Approve.approved());
        assert!(!ApprovalDecision::Reject.approved());
    }
}
