//! Bookable date-window arithmetic.

use chrono::{Duration, NaiveDate};

use super::super::domain::{DateRange, Prison};

/// Window in which the prison accepts bookings: today plus the configured
/// minimum notice through today plus the maximum, inclusive both ends.
pub(crate) fn base_range(prison: &Prison, today: NaiveDate) -> DateRange {
    DateRange::new(
        today + Duration::days(prison.policy_notice_days_min),
        today + Duration::days(prison.policy_notice_days_max),
    )
}

/// Clamp the base window to the legal sub-range reported for a visitor ban.
///
/// `legal` is the collaborator's answer: `None` means no legal window
/// remains, and the caller must return no sessions. A `Some` answer is still
/// intersected with the base window so a misreported range can never widen
/// it.
pub(crate) fn constrain(base: DateRange, legal: Option<DateRange>) -> Option<DateRange> {
    legal.and_then(|window| base.intersect(&window))
}
