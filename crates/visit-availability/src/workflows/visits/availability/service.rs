//! Composition of the availability pipeline over the collaborator fan-out.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::super::domain::{
    AppointmentEvent, AvailableVisitSession, BankHoliday, DateRange, PrisonerId, Restriction,
    SessionCandidate,
};
use super::appointments;
use super::config::AvailabilityPolicy;
use super::exclusions::{self, ExclusionCalendar};
use super::range;
use super::restriction::{self, RestrictionSignals};
use super::review;
use super::sources::{
    AppointmentSource, ExclusionSource, HolidaySource, PrisonSource, PrisonerRestrictionSource,
    ReviewSignalSource, SessionLookup, SessionSource, SourceError, SourceResult,
    VisitorRestrictionSource,
};

/// Inputs for one availability computation.
#[derive(Debug, Clone)]
pub struct AvailabilityRequest {
    pub prison_code: String,
    pub prisoner_id: PrisonerId,
    /// Caller preference, honoured only when no closed restriction applies.
    pub requested_restriction: Option<Restriction>,
    pub visitor_ids: Vec<i64>,
    /// When false the appointment feed is never consulted and clashes are
    /// left in place (staff-facing flows treat them as advisory).
    pub appointment_check: bool,
    /// Reference date for the booking window; defaults to the current day.
    pub today: Option<NaiveDate>,
}

/// Collaborator handles the engine fans out to.
#[derive(Clone)]
pub struct Collaborators {
    pub prisons: Arc<dyn PrisonSource>,
    pub sessions: Arc<dyn SessionSource>,
    pub prisoner_restrictions: Arc<dyn PrisonerRestrictionSource>,
    pub visitor_restrictions: Arc<dyn VisitorRestrictionSource>,
    pub appointments: Arc<dyn AppointmentSource>,
    pub exclusions: Arc<dyn ExclusionSource>,
    pub holidays: Arc<dyn HolidaySource>,
    pub review_signals: Arc<dyn ReviewSignalSource>,
}

/// Error surfaced when a mandatory collaborator fails. Best-effort
/// collaborators never raise this; they degrade to empty results.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("prison {0} is not registered with the scheduler")]
    UnknownPrison(String),
    #[error("{collaborator} lookup failed: {source}")]
    Collaborator {
        collaborator: &'static str,
        #[source]
        source: SourceError,
    },
}

/// Stateless engine producing the authoritative bookable-session list for a
/// prisoner, prison, and candidate visitor set.
pub struct AvailabilityService {
    collaborators: Collaborators,
    policy: AvailabilityPolicy,
}

impl AvailabilityService {
    pub fn new(collaborators: Collaborators, policy: AvailabilityPolicy) -> Self {
        Self {
            collaborators,
            policy,
        }
    }

    pub fn policy(&self) -> &AvailabilityPolicy {
        &self.policy
    }

    /// Compute the ordered, deduplicated list of bookable visit sessions.
    ///
    /// An empty list is a legitimate answer: an empty booking window, a
    /// visitor ban covering the whole window, or missing template coverage
    /// all produce `Ok(vec![])`. Only mandatory collaborator failures and
    /// unknown prisons are errors.
    pub async fn available_visit_sessions(
        &self,
        request: AvailabilityRequest,
    ) -> Result<Vec<AvailableVisitSession>, AvailabilityError> {
        let today = request
            .today
            .unwrap_or_else(|| Local::now().date_naive());

        let prison = self
            .mandatory(
                "prison register",
                self.collaborators.prisons.prison(&request.prison_code),
            )
            .await?
            .ok_or_else(|| AvailabilityError::UnknownPrison(request.prison_code.clone()))?;

        let base = range::base_range(&prison, today);
        if !base.is_valid() {
            warn!(
                prison = %prison.code,
                range = %base,
                "notice-day policy produced an empty booking window"
            );
            return Ok(Vec::new());
        }

        // The restriction, ban, and review lookups are independent; issue
        // them together under the per-call budget.
        let (prisoner_closed, visitors_closed, legal_window, review_active) = tokio::join!(
            self.mandatory(
                "prisoner restrictions",
                self.collaborators
                    .prisoner_restrictions
                    .has_closed_restriction(&request.prisoner_id),
            ),
            self.visitors_closed(&request),
            self.legal_window(&request, base),
            self.mandatory(
                "review signals",
                self.collaborators
                    .review_signals
                    .review_active(&request.prisoner_id, &request.visitor_ids),
            ),
        );
        let signals = RestrictionSignals {
            prisoner_closed: prisoner_closed?,
            visitors_closed: visitors_closed?,
        };
        let legal_window = legal_window?;
        let review_active = review_active?;

        let restriction = restriction::resolve(signals, request.requested_restriction);
        if request.requested_restriction == Some(Restriction::Open)
            && restriction == Restriction::Closed
        {
            debug!(
                prisoner = %request.prisoner_id,
                "requested OPEN visiting overridden by an active closed restriction"
            );
        }

        let window = match range::constrain(base, legal_window) {
            Some(window) => window,
            None => {
                info!(
                    prisoner = %request.prisoner_id,
                    base = %base,
                    "visitor ban leaves no bookable window"
                );
                return Ok(Vec::new());
            }
        };

        let candidates = match self
            .mandatory(
                "session templates",
                self.collaborators.sessions.candidate_sessions(
                    &request.prison_code,
                    &window,
                    restriction,
                ),
            )
            .await?
        {
            SessionLookup::Sessions(candidates) => candidates,
            SessionLookup::NoValidRange => {
                info!(
                    prison = %request.prison_code,
                    window = %window,
                    "no session template coverage for the booking window"
                );
                return Ok(Vec::new());
            }
        };
        let candidates = self.contained_in_window(candidates, &window);

        let template_refs: BTreeSet<String> = candidates
            .iter()
            .map(|candidate| candidate.session_template_ref.clone())
            .collect();

        let (events, calendar, holidays) = tokio::join!(
            self.prisoner_events(&request, &window),
            self.exclusion_calendar(&request.prison_code, &template_refs),
            self.bank_holidays(),
        );
        let events = events?;

        let candidates = if request.appointment_check {
            appointments::filter_conflicts(candidates, &events, &self.policy)
        } else {
            candidates
        };
        let candidates = exclusions::filter_excluded(candidates, &calendar);

        let mut sessions = review::annotate(candidates, review_active, &holidays, &self.policy);
        sessions.sort_by_key(|session| session.sort_key());
        sessions.dedup();

        info!(
            prison = %request.prison_code,
            prisoner = %request.prisoner_id,
            restriction = restriction.label(),
            window = %window,
            session_count = sessions.len(),
            review_active,
            "computed available visit sessions"
        );
        Ok(sessions)
    }

    async fn visitors_closed(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<bool, AvailabilityError> {
        if request.visitor_ids.is_empty() {
            return Ok(false);
        }
        self.mandatory(
            "visitor restrictions",
            self.collaborators.visitor_restrictions.have_closed_restriction(
                &request.prisoner_id,
                &request.visitor_ids,
            ),
        )
        .await
    }

    async fn legal_window(
        &self,
        request: &AvailabilityRequest,
        base: DateRange,
    ) -> Result<Option<DateRange>, AvailabilityError> {
        if request.visitor_ids.is_empty() {
            return Ok(Some(base));
        }
        self.mandatory(
            "visitor restrictions",
            self.collaborators.visitor_restrictions.banned_range_intersection(
                &request.prisoner_id,
                &request.visitor_ids,
                &base,
            ),
        )
        .await
    }

    async fn prisoner_events(
        &self,
        request: &AvailabilityRequest,
        window: &DateRange,
    ) -> Result<Vec<AppointmentEvent>, AvailabilityError> {
        if !request.appointment_check {
            return Ok(Vec::new());
        }
        self.mandatory(
            "scheduled appointments",
            self.collaborators
                .appointments
                .scheduled_events(&request.prisoner_id, window),
        )
        .await
    }

    /// Prison-wide closure dates plus one lookup per distinct template
    /// reference, all best-effort and issued concurrently.
    async fn exclusion_calendar(
        &self,
        prison_code: &str,
        template_refs: &BTreeSet<String>,
    ) -> ExclusionCalendar {
        let template_lookups = template_refs.iter().map(|template_ref| async move {
            let dates = self.exclusion_set(prison_code, Some(template_ref)).await;
            (template_ref.clone(), dates)
        });

        let (prison_wide, per_template) = tokio::join!(
            self.exclusion_set(prison_code, None),
            join_all(template_lookups),
        );

        ExclusionCalendar {
            prison_wide,
            per_template: per_template
                .into_iter()
                .filter(|(_, dates)| !dates.is_empty())
                .collect(),
        }
    }

    async fn exclusion_set(
        &self,
        prison_code: &str,
        template_ref: Option<&str>,
    ) -> BTreeSet<NaiveDate> {
        match self
            .with_budget(
                self.collaborators
                    .exclusions
                    .exclusion_dates(prison_code, template_ref),
            )
            .await
        {
            Ok(dates) => dates,
            Err(err) => {
                warn!(
                    prison = prison_code,
                    template = ?template_ref,
                    error = %err,
                    "exclusion-date lookup failed, continuing without closures"
                );
                BTreeSet::new()
            }
        }
    }

    async fn bank_holidays(&self) -> Vec<BankHoliday> {
        match self
            .with_budget(self.collaborators.holidays.bank_holidays())
            .await
        {
            Ok(holidays) => holidays,
            Err(err) => {
                warn!(
                    error = %err,
                    "bank-holiday feed unavailable, continuing without holidays"
                );
                Vec::new()
            }
        }
    }

    /// Defensive upholding of the range invariant: a misbehaving session
    /// source cannot push slots outside the constrained window.
    fn contained_in_window(
        &self,
        candidates: Vec<SessionCandidate>,
        window: &DateRange,
    ) -> Vec<SessionCandidate> {
        candidates
            .into_iter()
            .filter(|candidate| {
                if window.contains(candidate.date) {
                    true
                } else {
                    warn!(
                        session_template_ref = %candidate.session_template_ref,
                        date = %candidate.date,
                        window = %window,
                        "session source returned a slot outside the requested window"
                    );
                    false
                }
            })
            .collect()
    }

    async fn mandatory<T>(
        &self,
        collaborator: &'static str,
        call: impl Future<Output = SourceResult<T>>,
    ) -> Result<T, AvailabilityError> {
        self.with_budget(call)
            .await
            .map_err(|source| AvailabilityError::Collaborator {
                collaborator,
                source,
            })
    }

    async fn with_budget<T>(&self, call: impl Future<Output = SourceResult<T>>) -> SourceResult<T> {
        match tokio::time::timeout(self.policy.collaborator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.policy.collaborator_timeout)),
        }
    }
}
