use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for prisoners (offender number, e.g. "A1234BC").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrisonerId(pub String);

impl fmt::Display for PrisonerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visiting condition attached to a session: OPEN is a normal social visit,
/// CLOSED is non-contact/supervised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Restriction {
    Open,
    Closed,
}

impl Restriction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

/// Inclusive date window, both ends bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl DateRange {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self { from_date, to_date }
    }

    pub fn is_valid(&self) -> bool {
        self.from_date <= self.to_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }

    /// Overlap of two inclusive windows, `None` when they are disjoint.
    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        let from_date = self.from_date.max(other.from_date);
        let to_date = self.to_date.min(other.to_date);
        if from_date <= to_date {
            Some(DateRange { from_date, to_date })
        } else {
            None
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from_date, self.to_date)
    }
}

/// Prison registration data the engine needs: identity plus the notice-day
/// booking policy configured for the establishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prison {
    pub code: String,
    pub policy_notice_days_min: i64,
    pub policy_notice_days_max: i64,
}

/// One potential visit slot published by the session-template authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCandidate {
    pub session_template_ref: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub restriction: Restriction,
}

/// A prisoner's scheduled event from the activities feed. Times are optional
/// because all-day events carry neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentEvent {
    pub event_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub event_type: String,
    pub event_sub_type: String,
}

/// Public holiday from the national feed, England & Wales division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankHoliday {
    pub date: NaiveDate,
    pub title: String,
}

/// Start/end pair presented to booking calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Final bookable slot handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableVisitSession {
    pub session_template_ref: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub restriction: Restriction,
    pub session_for_review: bool,
}

impl AvailableVisitSession {
    /// Presentation order key: date, then start, then end.
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime, NaiveTime) {
        (self.date, self.time_slot.start_time, self.time_slot.end_time)
    }
}
