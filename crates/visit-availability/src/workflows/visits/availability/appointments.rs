//! Removal of candidate slots that clash with higher-priority prisoner
//! appointments (medical and legal scheduled events).

use chrono::NaiveTime;
use tracing::debug;

use super::super::domain::{AppointmentEvent, SessionCandidate};
use super::config::AvailabilityPolicy;

/// Event type carried by scheduled appointments in the activities feed.
const SCHEDULED_APPOINTMENT_TYPE: &str = "APP";

/// The subset of events that outranks a social visit: scheduled `APP`
/// entries whose sub-type is in the policy allow-list. Applied once, before
/// the per-candidate loop.
pub(crate) fn higher_priority_appointments<'a>(
    events: &'a [AppointmentEvent],
    policy: &AvailabilityPolicy,
) -> Vec<&'a AppointmentEvent> {
    events
        .iter()
        .filter(|event| event.event_type == SCHEDULED_APPOINTMENT_TYPE)
        .filter(|event| {
            policy
                .higher_priority_sub_types
                .contains(event.event_sub_type.as_str())
        })
        .collect()
}

/// Drop every candidate that overlaps at least one higher-priority
/// appointment on the same date. Dropped slots are never surfaced or
/// flagged; the removal is logged for operational traceability.
pub(crate) fn filter_conflicts(
    candidates: Vec<SessionCandidate>,
    events: &[AppointmentEvent],
    policy: &AvailabilityPolicy,
) -> Vec<SessionCandidate> {
    let appointments = higher_priority_appointments(events, policy);
    if appointments.is_empty() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|candidate| {
            let clashes: Vec<&str> = appointments
                .iter()
                .filter(|appointment| {
                    appointment.event_date == candidate.date && overlaps(candidate, appointment)
                })
                .map(|appointment| appointment.event_sub_type.as_str())
                .collect();

            if clashes.is_empty() {
                true
            } else {
                debug!(
                    session_template_ref = %candidate.session_template_ref,
                    date = %candidate.date,
                    clash_count = clashes.len(),
                    sub_types = ?clashes,
                    "dropping visit slot that overlaps higher-priority appointments"
                );
                false
            }
        })
        .collect()
}

/// Interval test between a candidate slot and an appointment on the same
/// date: slot start inside the appointment, slot end inside it, or the
/// appointment fully inside the slot. Ties on the slot boundaries count as
/// overlap.
fn overlaps(slot: &SessionCandidate, appointment: &AppointmentEvent) -> bool {
    let appointment_start = appointment.start_time.unwrap_or(NaiveTime::MIN);
    let appointment_end = appointment.end_time.unwrap_or_else(end_of_day);

    (slot.start_time >= appointment_start && slot.start_time < appointment_end)
        || (slot.end_time > appointment_start && slot.end_time <= appointment_end)
        || (appointment_start >= slot.start_time && appointment_end <= slot.end_time)
}

/// Upper bound for events with no recorded end time.
fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("23:59:59 is a valid time of day")
}
