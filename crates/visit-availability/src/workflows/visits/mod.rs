//! Prison social-visit workflows.

pub mod availability;
pub mod domain;

pub use domain::{
    AppointmentEvent, AvailableVisitSession, BankHoliday, DateRange, Prison, PrisonerId,
    Restriction, SessionCandidate, TimeSlot,
};
