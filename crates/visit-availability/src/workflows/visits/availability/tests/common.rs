use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::workflows::visits::availability::config::AvailabilityPolicy;
use crate::workflows::visits::availability::sources::{
    AppointmentSource, ExclusionSource, HolidaySource, PrisonSource, PrisonerRestrictionSource,
    ReviewSignalSource, SessionLookup, SessionSource, SourceError, SourceResult,
    VisitorRestrictionSource,
};
use crate::workflows::visits::availability::{
    AvailabilityRequest, AvailabilityService, Collaborators,
};
use crate::workflows::visits::domain::{
    AppointmentEvent, BankHoliday, DateRange, Prison, PrisonerId, Restriction, SessionCandidate,
};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Fixed reference date for deterministic windows: Monday 2026-08-03.
pub(super) fn today() -> NaiveDate {
    date(2026, 8, 3)
}

pub(super) fn hewell() -> Prison {
    Prison {
        code: "HEI".to_string(),
        policy_notice_days_min: 2,
        policy_notice_days_max: 28,
    }
}

pub(super) fn candidate(
    template_ref: &str,
    on: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    restriction: Restriction,
) -> SessionCandidate {
    SessionCandidate {
        session_template_ref: template_ref.to_string(),
        date: on,
        start_time: time(start.0, start.1),
        end_time: time(end.0, end.1),
        restriction,
    }
}

pub(super) fn appointment(
    on: NaiveDate,
    start: Option<(u32, u32)>,
    end: Option<(u32, u32)>,
    event_type: &str,
    event_sub_type: &str,
) -> AppointmentEvent {
    AppointmentEvent {
        event_date: on,
        start_time: start.map(|(h, m)| time(h, m)),
        end_time: end.map(|(h, m)| time(h, m)),
        event_type: event_type.to_string(),
        event_sub_type: event_sub_type.to_string(),
    }
}

pub(super) fn holiday(on: NaiveDate, title: &str) -> BankHoliday {
    BankHoliday {
        date: on,
        title: title.to_string(),
    }
}

/// Arguments observed by the stub collaborators, for call assertions.
#[derive(Default)]
pub(super) struct Recorded {
    pub(super) session_requests: Mutex<Vec<(String, DateRange, Restriction)>>,
    pub(super) appointment_calls: Mutex<usize>,
}

/// Single stub standing in for every collaborator, configured per test.
/// Failure toggles surface `SourceError::Unavailable` for the matching
/// trait so hard/soft policy can be asserted collaborator by collaborator.
pub(super) struct StubCollaborators {
    pub(super) prison: Option<Prison>,
    pub(super) prison_unavailable: bool,
    pub(super) sessions: Vec<SessionCandidate>,
    pub(super) no_valid_range: bool,
    pub(super) sessions_unavailable: bool,
    pub(super) prisoner_closed: bool,
    pub(super) prisoner_restrictions_unavailable: bool,
    pub(super) visitors_closed: bool,
    pub(super) visitor_restrictions_unavailable: bool,
    /// `None` echoes the candidate range back (no ban); `Some(inner)` is
    /// returned verbatim.
    pub(super) legal_window: Option<Option<DateRange>>,
    pub(super) events: Vec<AppointmentEvent>,
    pub(super) appointments_unavailable: bool,
    pub(super) prison_wide_exclusions: BTreeSet<NaiveDate>,
    pub(super) template_exclusions: HashMap<String, BTreeSet<NaiveDate>>,
    pub(super) exclusions_unavailable: bool,
    pub(super) holidays: Vec<BankHoliday>,
    pub(super) holidays_unavailable: bool,
    pub(super) review_active: bool,
    pub(super) review_signals_unavailable: bool,
    pub(super) recorded: Recorded,
}

impl Default for StubCollaborators {
    fn default() -> Self {
        Self {
            prison: Some(hewell()),
            prison_unavailable: false,
            sessions: Vec::new(),
            no_valid_range: false,
            sessions_unavailable: false,
            prisoner_closed: false,
            prisoner_restrictions_unavailable: false,
            visitors_closed: false,
            visitor_restrictions_unavailable: false,
            legal_window: None,
            events: Vec::new(),
            appointments_unavailable: false,
            prison_wide_exclusions: BTreeSet::new(),
            template_exclusions: HashMap::new(),
            exclusions_unavailable: false,
            holidays: Vec::new(),
            holidays_unavailable: false,
            review_active: false,
            review_signals_unavailable: false,
            recorded: Recorded::default(),
        }
    }
}

fn unavailable<T>(what: &str) -> SourceResult<T> {
    Err(SourceError::Unavailable(format!("{what} offline")))
}

#[async_trait]
impl PrisonSource for StubCollaborators {
    async fn prison(&self, prison_code: &str) -> SourceResult<Option<Prison>> {
        if self.prison_unavailable {
            return unavailable("prison register");
        }
        Ok(self
            .prison
            .clone()
            .filter(|prison| prison.code == prison_code))
    }
}

#[async_trait]
impl SessionSource for StubCollaborators {
    async fn candidate_sessions(
        &self,
        prison_code: &str,
        range: &DateRange,
        restriction: Restriction,
    ) -> SourceResult<SessionLookup> {
        if self.sessions_unavailable {
            return unavailable("session templates");
        }
        self.recorded
            .session_requests
            .lock()
            .expect("session request mutex poisoned")
            .push((prison_code.to_string(), *range, restriction));
        if self.no_valid_range {
            return Ok(SessionLookup::NoValidRange);
        }
        Ok(SessionLookup::Sessions(self.sessions.clone()))
    }
}

#[async_trait]
impl PrisonerRestrictionSource for StubCollaborators {
    async fn has_closed_restriction(&self, _prisoner_id: &PrisonerId) -> SourceResult<bool> {
        if self.prisoner_restrictions_unavailable {
            return unavailable("prisoner restrictions");
        }
        Ok(self.prisoner_closed)
    }
}

#[async_trait]
impl VisitorRestrictionSource for StubCollaborators {
    async fn have_closed_restriction(
        &self,
        _prisoner_id: &PrisonerId,
        _visitor_ids: &[i64],
    ) -> SourceResult<bool> {
        if self.visitor_restrictions_unavailable {
            return unavailable("visitor restrictions");
        }
        Ok(self.visitors_closed)
    }

    async fn banned_range_intersection(
        &self,
        _prisoner_id: &PrisonerId,
        _visitor_ids: &[i64],
        candidate_range: &DateRange,
    ) -> SourceResult<Option<DateRange>> {
        if self.visitor_restrictions_unavailable {
            return unavailable("visitor restrictions");
        }
        match &self.legal_window {
            Some(window) => Ok(*window),
            None => Ok(Some(*candidate_range)),
        }
    }
}

#[async_trait]
impl AppointmentSource for StubCollaborators {
    async fn scheduled_events(
        &self,
        _prisoner_id: &PrisonerId,
        _range: &DateRange,
    ) -> SourceResult<Vec<AppointmentEvent>> {
        *self
            .recorded
            .appointment_calls
            .lock()
            .expect("appointment call mutex poisoned") += 1;
        if self.appointments_unavailable {
            return unavailable("scheduled appointments");
        }
        Ok(self.events.clone())
    }
}

#[async_trait]
impl ExclusionSource for StubCollaborators {
    async fn exclusion_dates(
        &self,
        _prison_code: &str,
        session_template_ref: Option<&str>,
    ) -> SourceResult<BTreeSet<NaiveDate>> {
        if self.exclusions_unavailable {
            return unavailable("exclusion dates");
        }
        Ok(match session_template_ref {
            None => self.prison_wide_exclusions.clone(),
            Some(template_ref) => self
                .template_exclusions
                .get(template_ref)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl HolidaySource for StubCollaborators {
    async fn bank_holidays(&self) -> SourceResult<Vec<BankHoliday>> {
        if self.holidays_unavailable {
            return unavailable("bank holidays");
        }
        Ok(self.holidays.clone())
    }
}

#[async_trait]
impl ReviewSignalSource for StubCollaborators {
    async fn review_active(
        &self,
        _prisoner_id: &PrisonerId,
        _visitor_ids: &[i64],
    ) -> SourceResult<bool> {
        if self.review_signals_unavailable {
            return unavailable("review signals");
        }
        Ok(self.review_active)
    }
}

pub(super) fn collaborators(stub: Arc<StubCollaborators>) -> Collaborators {
    Collaborators {
        prisons: stub.clone(),
        sessions: stub.clone(),
        prisoner_restrictions: stub.clone(),
        visitor_restrictions: stub.clone(),
        appointments: stub.clone(),
        exclusions: stub.clone(),
        holidays: stub.clone(),
        review_signals: stub,
    }
}

pub(super) fn service(stub: Arc<StubCollaborators>) -> AvailabilityService {
    AvailabilityService::new(collaborators(stub), AvailabilityPolicy::default())
}

pub(super) fn request() -> AvailabilityRequest {
    AvailabilityRequest {
        prison_code: "HEI".to_string(),
        prisoner_id: PrisonerId("A1234BC".to_string()),
        requested_restriction: None,
        visitor_ids: Vec::new(),
        appointment_check: true,
        today: Some(today()),
    }
}
