//! Collaborator contracts the availability engine fans out to.
//!
//! Every method distinguishes "found", "nothing found", and "the call
//! failed" explicitly, so the orchestrator can apply the mandatory versus
//! best-effort policy per collaborator instead of inferring it from nulls.
//! Implementations are HTTP clients in production and in-memory fixtures in
//! tests and the bundled service.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::super::domain::{
    AppointmentEvent, BankHoliday, DateRange, Prison, PrisonerId, Restriction, SessionCandidate,
};

/// Result type for collaborator calls.
pub type SourceResult<T> = Result<T, SourceError>;

/// Failure of a single collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator returned malformed data: {0}")]
    Malformed(String),
    #[error("collaborator call exceeded the {}ms budget", .0.as_millis())]
    Timeout(Duration),
}

/// Prison register lookup. Mandatory: the notice-day policy gates the whole
/// computation.
#[async_trait]
pub trait PrisonSource: Send + Sync {
    /// `Ok(None)` means the code is not registered, which callers surface as
    /// a not-found error rather than an empty session list.
    async fn prison(&self, prison_code: &str) -> SourceResult<Option<Prison>>;
}

/// Outcome of a candidate-session request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Sessions(Vec<SessionCandidate>),
    /// The scheduling authority has no template coverage for the window.
    /// A legitimate, common answer - not an error.
    NoValidRange,
}

/// The external session-template authority. Mandatory.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn candidate_sessions(
        &self,
        prison_code: &str,
        range: &DateRange,
        restriction: Restriction,
    ) -> SourceResult<SessionLookup>;
}

/// Prisoner-restriction lookup. Mandatory; absence of data means "no
/// restriction found", never CLOSED.
#[async_trait]
pub trait PrisonerRestrictionSource: Send + Sync {
    async fn has_closed_restriction(&self, prisoner_id: &PrisonerId) -> SourceResult<bool>;
}

/// Visitor-restriction lookups. Mandatory.
#[async_trait]
pub trait VisitorRestrictionSource: Send + Sync {
    /// Whether any of the supplied visitors carries an active closed-type
    /// restriction.
    async fn have_closed_restriction(
        &self,
        prisoner_id: &PrisonerId,
        visitor_ids: &[i64],
    ) -> SourceResult<bool>;

    /// The tightest sub-range of `candidate_range` in which booking remains
    /// legal given any visitor bans. Returns the candidate range itself when
    /// no ban applies, and `None` when no legal window remains.
    async fn banned_range_intersection(
        &self,
        prisoner_id: &PrisonerId,
        visitor_ids: &[i64],
        candidate_range: &DateRange,
    ) -> SourceResult<Option<DateRange>>;
}

/// Scheduled-event feed for a prisoner. Mandatory when the caller requests
/// appointment-aware filtering; never consulted otherwise.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    async fn scheduled_events(
        &self,
        prisoner_id: &PrisonerId,
        range: &DateRange,
    ) -> SourceResult<Vec<AppointmentEvent>>;
}

/// Prison closure dates. Best-effort: a failed lookup degrades to "no
/// closures".
#[async_trait]
pub trait ExclusionSource: Send + Sync {
    /// Prison-wide closure dates when `session_template_ref` is `None`,
    /// template-scoped dates otherwise.
    async fn exclusion_dates(
        &self,
        prison_code: &str,
        session_template_ref: Option<&str>,
    ) -> SourceResult<BTreeSet<NaiveDate>>;
}

/// National bank-holiday feed. Best-effort: a failed fetch degrades to an
/// empty holiday set.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn bank_holidays(&self) -> SourceResult<Vec<BankHoliday>>;
}

/// Whether a manual-review condition is active for the prisoner/visitor set.
/// The qualifying alert codes and restriction categories are configuration
/// owned by the implementation; the engine consumes only the signal.
#[async_trait]
pub trait ReviewSignalSource: Send + Sync {
    async fn review_active(
        &self,
        prisoner_id: &PrisonerId,
        visitor_ids: &[i64],
    ) -> SourceResult<bool>;
}
