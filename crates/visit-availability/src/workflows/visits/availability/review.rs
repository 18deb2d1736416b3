//! Manual-review windowing: weekend and holiday handling applied when a
//! review condition is active for the prisoner or visitor set.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use super::super::domain::{AvailableVisitSession, BankHoliday, SessionCandidate, TimeSlot};
use super::config::{AvailabilityPolicy, HolidayEmbargo};

/// Turn surviving candidates into the final session records.
///
/// With no review condition every candidate passes through unflagged. Under
/// review, weekend slots are never bookable, bank holidays embargo dates
/// according to the configured policy, and everything that survives is
/// flagged for manual review.
pub(crate) fn annotate(
    candidates: Vec<SessionCandidate>,
    review_active: bool,
    holidays: &[BankHoliday],
    policy: &AvailabilityPolicy,
) -> Vec<AvailableVisitSession> {
    if !review_active {
        return candidates
            .into_iter()
            .map(|candidate| to_session(candidate, false))
            .collect();
    }

    let weekday_candidates: Vec<SessionCandidate> = candidates
        .into_iter()
        .filter(|candidate| {
            if is_weekend(candidate.date) {
                debug!(
                    session_template_ref = %candidate.session_template_ref,
                    date = %candidate.date,
                    "dropping weekend visit slot while review is active"
                );
                false
            } else {
                true
            }
        })
        .collect();

    match policy.holiday_embargo {
        HolidayEmbargo::ThroughHoliday => {
            let cutoff = embargo_cutoff(&weekday_candidates, holidays);
            weekday_candidates
                .into_iter()
                .filter(|candidate| cutoff.map_or(true, |cut| candidate.date > cut))
                .map(|candidate| to_session(candidate, true))
                .collect()
        }
        HolidayEmbargo::HolidayOnly => {
            let holiday_dates: BTreeSet<NaiveDate> =
                holidays.iter().map(|holiday| holiday.date).collect();
            weekday_candidates
                .into_iter()
                .filter(|candidate| !holiday_dates.contains(&candidate.date))
                .map(|candidate| to_session(candidate, true))
                .collect()
        }
    }
}

/// Latest bank holiday landing inside the candidate span. Dates up to and
/// including it are withheld, pushing the first reviewable slot to the next
/// clear weekday.
fn embargo_cutoff(candidates: &[SessionCandidate], holidays: &[BankHoliday]) -> Option<NaiveDate> {
    let first = candidates.iter().map(|candidate| candidate.date).min()?;
    let last = candidates.iter().map(|candidate| candidate.date).max()?;

    holidays
        .iter()
        .map(|holiday| holiday.date)
        .filter(|date| first <= *date && *date <= last)
        .max()
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn to_session(candidate: SessionCandidate, session_for_review: bool) -> AvailableVisitSession {
    AvailableVisitSession {
        session_template_ref: candidate.session_template_ref,
        date: candidate.date,
        time_slot: TimeSlot {
            start_time: candidate.start_time,
            end_time: candidate.end_time,
        },
        restriction: candidate.restriction,
        session_for_review,
    }
}
