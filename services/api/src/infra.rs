use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use metrics_exporter_prometheus::PrometheusHandle;
use visit_availability::config::BookingConfig;
use visit_availability::workflows::visits::availability::{
    AppointmentSource, AvailabilityPolicy, Collaborators, ExclusionSource, HolidaySource,
    PrisonSource, PrisonerRestrictionSource, ReviewSignalSource, SessionLookup, SessionSource,
    SourceResult, VisitorRestrictionSource,
};
use visit_availability::workflows::visits::{
    AppointmentEvent, BankHoliday, DateRange, Prison, PrisonerId, Restriction, SessionCandidate,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Prison register backed by a static map. Real deployments resolve this
/// against the prison-register service.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPrisonRegister {
    prisons: HashMap<String, Prison>,
}

impl InMemoryPrisonRegister {
    pub(crate) fn with_prisons(prisons: Vec<Prison>) -> Self {
        Self {
            prisons: prisons
                .into_iter()
                .map(|prison| (prison.code.clone(), prison))
                .collect(),
        }
    }
}

#[async_trait]
impl PrisonSource for InMemoryPrisonRegister {
    async fn prison(&self, prison_code: &str) -> SourceResult<Option<Prison>> {
        Ok(self.prisons.get(prison_code).cloned())
    }
}

/// Session-template authority serving a fixed slot list filtered by window
/// and restriction.
#[derive(Default, Clone)]
pub(crate) struct FixtureSessionSource {
    sessions: Vec<SessionCandidate>,
}

impl FixtureSessionSource {
    pub(crate) fn with_sessions(sessions: Vec<SessionCandidate>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl SessionSource for FixtureSessionSource {
    async fn candidate_sessions(
        &self,
        _prison_code: &str,
        range: &DateRange,
        restriction: Restriction,
    ) -> SourceResult<SessionLookup> {
        Ok(SessionLookup::Sessions(
            self.sessions
                .iter()
                .filter(|session| session.restriction == restriction)
                .filter(|session| range.contains(session.date))
                .cloned()
                .collect(),
        ))
    }
}

#[derive(Default, Clone)]
pub(crate) struct StaticPrisonerRestrictions {
    closed_prisoners: BTreeSet<String>,
}

impl StaticPrisonerRestrictions {
    pub(crate) fn with_closed(closed_prisoners: BTreeSet<String>) -> Self {
        Self { closed_prisoners }
    }
}

#[async_trait]
impl PrisonerRestrictionSource for StaticPrisonerRestrictions {
    async fn has_closed_restriction(&self, prisoner_id: &PrisonerId) -> SourceResult<bool> {
        Ok(self.closed_prisoners.contains(&prisoner_id.0))
    }
}

/// Visitor restrictions: closed-visiting visitors plus ban windows that
/// push the legal booking range past their expiry.
#[derive(Default, Clone)]
pub(crate) struct StaticVisitorRestrictions {
    closed_visitors: BTreeSet<i64>,
    bans: HashMap<i64, DateRange>,
}

impl StaticVisitorRestrictions {
    pub(crate) fn new(closed_visitors: BTreeSet<i64>, bans: HashMap<i64, DateRange>) -> Self {
        Self {
            closed_visitors,
            bans,
        }
    }
}

#[async_trait]
impl VisitorRestrictionSource for StaticVisitorRestrictions {
    async fn have_closed_restriction(
        &self,
        _prisoner_id: &PrisonerId,
        visitor_ids: &[i64],
    ) -> SourceResult<bool> {
        Ok(visitor_ids
            .iter()
            .any(|visitor| self.closed_visitors.contains(visitor)))
    }

    async fn banned_range_intersection(
        &self,
        _prisoner_id: &PrisonerId,
        visitor_ids: &[i64],
        candidate_range: &DateRange,
    ) -> SourceResult<Option<DateRange>> {
        let mut from_date = candidate_range.from_date;
        for visitor in visitor_ids {
            if let Some(ban) = self.bans.get(visitor) {
                if ban.from_date <= from_date && ban.to_date >= candidate_range.to_date {
                    return Ok(None);
                }
                if ban.from_date <= from_date && ban.to_date >= from_date {
                    from_date = ban.to_date + Duration::days(1);
                }
            }
        }
        if from_date > candidate_range.to_date {
            return Ok(None);
        }
        Ok(Some(DateRange::new(from_date, candidate_range.to_date)))
    }
}

#[derive(Default, Clone)]
pub(crate) struct StaticAppointments {
    events: Vec<AppointmentEvent>,
}

impl StaticAppointments {
    pub(crate) fn with_events(events: Vec<AppointmentEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl AppointmentSource for StaticAppointments {
    async fn scheduled_events(
        &self,
        _prisoner_id: &PrisonerId,
        range: &DateRange,
    ) -> SourceResult<Vec<AppointmentEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| range.contains(event.event_date))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct StaticExclusions {
    prison_wide: HashMap<String, BTreeSet<NaiveDate>>,
}

impl StaticExclusions {
    pub(crate) fn with_dates(prison_wide: HashMap<String, BTreeSet<NaiveDate>>) -> Self {
        Self { prison_wide }
    }
}

#[async_trait]
impl ExclusionSource for StaticExclusions {
    async fn exclusion_dates(
        &self,
        prison_code: &str,
        session_template_ref: Option<&str>,
    ) -> SourceResult<BTreeSet<NaiveDate>> {
        Ok(match session_template_ref {
            None => self.prison_wide.get(prison_code).cloned().unwrap_or_default(),
            Some(_) => BTreeSet::new(),
        })
    }
}

#[derive(Default, Clone)]
pub(crate) struct StaticHolidays {
    holidays: Vec<BankHoliday>,
}

impl StaticHolidays {
    pub(crate) fn with_holidays(holidays: Vec<BankHoliday>) -> Self {
        Self { holidays }
    }
}

#[async_trait]
impl HolidaySource for StaticHolidays {
    async fn bank_holidays(&self) -> SourceResult<Vec<BankHoliday>> {
        Ok(self.holidays.clone())
    }
}

/// Review signal derived from data-driven allow-lists: a prisoner alert code
/// or an active visitor-restriction category in the review set activates
/// manual review.
#[derive(Default, Clone)]
pub(crate) struct ReviewAllowList {
    review_alert_codes: BTreeSet<String>,
    review_restriction_categories: BTreeSet<String>,
    prisoner_alerts: HashMap<String, Vec<String>>,
    visitor_restriction_categories: HashMap<i64, Vec<String>>,
}

impl ReviewAllowList {
    pub(crate) fn new(
        review_alert_codes: BTreeSet<String>,
        review_restriction_categories: BTreeSet<String>,
        prisoner_alerts: HashMap<String, Vec<String>>,
        visitor_restriction_categories: HashMap<i64, Vec<String>>,
    ) -> Self {
        Self {
            review_alert_codes,
            review_restriction_categories,
            prisoner_alerts,
            visitor_restriction_categories,
        }
    }
}

#[async_trait]
impl ReviewSignalSource for ReviewAllowList {
    async fn review_active(
        &self,
        prisoner_id: &PrisonerId,
        visitor_ids: &[i64],
    ) -> SourceResult<bool> {
        let prisoner_flagged = self
            .prisoner_alerts
            .get(&prisoner_id.0)
            .is_some_and(|alerts| {
                alerts
                    .iter()
                    .any(|code| self.review_alert_codes.contains(code))
            });
        let visitor_flagged = visitor_ids.iter().any(|visitor| {
            self.visitor_restriction_categories
                .get(visitor)
                .is_some_and(|categories| {
                    categories
                        .iter()
                        .any(|category| self.review_restriction_categories.contains(category))
                })
        });
        Ok(prisoner_flagged || visitor_flagged)
    }
}

pub(crate) fn availability_policy(booking: &BookingConfig) -> AvailabilityPolicy {
    AvailabilityPolicy::with_timeout(booking.collaborator_timeout())
}

/// Fixture world for the `availability` CLI command and the default server
/// wiring: two prisons, a recurring slot pattern, one banned and one closed
/// visitor, a medical appointment, a closure date, and a review-flagged
/// prisoner.
pub(crate) fn demo_collaborators(today: NaiveDate) -> Collaborators {
    let prisons = vec![
        Prison {
            code: "HEI".to_string(),
            policy_notice_days_min: 2,
            policy_notice_days_max: 28,
        },
        Prison {
            code: "BLI".to_string(),
            policy_notice_days_min: 1,
            policy_notice_days_max: 14,
        },
    ];

    let mut sessions = Vec::new();
    for offset in 1..=28 {
        let on = today + Duration::days(offset);
        match on.weekday() {
            Weekday::Tue | Weekday::Thu | Weekday::Sat => {
                sessions.push(fixture_slot("hei-main-open", on, (14, 0), (16, 0), Restriction::Open));
                sessions.push(fixture_slot("hei-main-closed", on, (10, 0), (11, 0), Restriction::Closed));
            }
            Weekday::Wed => {
                sessions.push(fixture_slot("hei-morning-open", on, (9, 30), (11, 30), Restriction::Open));
            }
            _ => {}
        }
    }

    let events = vec![AppointmentEvent {
        event_date: next_weekday(today + Duration::days(3), Weekday::Tue),
        start_time: Some(NaiveTime::from_hms_opt(14, 30, 0).expect("valid time")),
        end_time: Some(NaiveTime::from_hms_opt(15, 0, 0).expect("valid time")),
        event_type: "APP".to_string(),
        event_sub_type: "MEDO".to_string(),
    }];

    let exclusions = HashMap::from([(
        "HEI".to_string(),
        BTreeSet::from([next_weekday(today + Duration::days(3), Weekday::Thu)]),
    )]);

    let holidays = vec![
        BankHoliday {
            date: NaiveDate::from_ymd_opt(2026, 8, 31).expect("valid date"),
            title: "Summer bank holiday".to_string(),
        },
        BankHoliday {
            date: NaiveDate::from_ymd_opt(2026, 12, 25).expect("valid date"),
            title: "Christmas Day".to_string(),
        },
    ];

    let review_codes: BTreeSet<String> = ["XR", "XEL", "XCU", "RVR"]
        .iter()
        .map(|code| (*code).to_string())
        .collect();
    let review_categories: BTreeSet<String> = ["PREINF", "RESTRICTED"]
        .iter()
        .map(|category| (*category).to_string())
        .collect();

    Collaborators {
        prisons: Arc::new(InMemoryPrisonRegister::with_prisons(prisons)),
        sessions: Arc::new(FixtureSessionSource::with_sessions(sessions)),
        prisoner_restrictions: Arc::new(StaticPrisonerRestrictions::with_closed(
            BTreeSet::from(["B2345CD".to_string()]),
        )),
        visitor_restrictions: Arc::new(StaticVisitorRestrictions::new(
            BTreeSet::from([1111]),
            HashMap::from([(
                2222,
                DateRange::new(today, today + Duration::days(10)),
            )]),
        )),
        appointments: Arc::new(StaticAppointments::with_events(events)),
        exclusions: Arc::new(StaticExclusions::with_dates(exclusions)),
        holidays: Arc::new(StaticHolidays::with_holidays(holidays)),
        review_signals: Arc::new(ReviewAllowList::new(
            review_codes,
            review_categories,
            HashMap::from([("C3456DE".to_string(), vec!["XR".to_string()])]),
            HashMap::from([(3333, vec!["PREINF".to_string()])]),
        )),
    }
}

fn fixture_slot(
    template_ref: &str,
    on: NaiveDate,
    start: (u32, u32),
    end: (u32, u32),
    restriction: Restriction,
) -> SessionCandidate {
    SessionCandidate {
        session_template_ref: template_ref.to_string(),
        date: on,
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).expect("valid time"),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).expect("valid time"),
        restriction,
    }
}

fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut date = from;
    while date.weekday() != weekday {
        date = date + Duration::days(1);
    }
    date
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_restriction(raw: &str) -> Result<Restriction, String> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "OPEN" => Ok(Restriction::Open),
        "CLOSED" => Ok(Restriction::Closed),
        other => Err(format!("'{other}' is not OPEN or CLOSED")),
    }
}
