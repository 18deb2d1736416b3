use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::common::*;
use crate::workflows::visits::availability::config::AvailabilityPolicy;
use crate::workflows::visits::availability::sources::{
    HolidaySource, SourceError, SourceResult,
};
use crate::workflows::visits::availability::{AvailabilityError, AvailabilityService};
use crate::workflows::visits::domain::{BankHoliday, DateRange, Restriction};

#[tokio::test]
async fn returns_all_candidates_sorted_when_nothing_filters() {
    let mut stub = StubCollaborators::default();
    // Ten in-window slots, deliberately unsorted.
    stub.sessions = vec![
        candidate("sess-b", date(2026, 8, 12), (14, 0), (16, 0), Restriction::Open),
        candidate("sess-a", date(2026, 8, 12), (9, 0), (10, 0), Restriction::Open),
        candidate("sess-a", date(2026, 8, 10), (9, 0), (10, 0), Restriction::Open),
        candidate("sess-b", date(2026, 8, 10), (14, 0), (16, 0), Restriction::Open),
        candidate("sess-a", date(2026, 8, 19), (9, 0), (10, 0), Restriction::Open),
        candidate("sess-b", date(2026, 8, 19), (14, 0), (16, 0), Restriction::Open),
        candidate("sess-a", date(2026, 8, 24), (9, 0), (10, 0), Restriction::Open),
        candidate("sess-b", date(2026, 8, 24), (14, 0), (16, 0), Restriction::Open),
        candidate("sess-a", date(2026, 8, 26), (9, 0), (10, 0), Restriction::Open),
        candidate("sess-b", date(2026, 8, 26), (14, 0), (16, 0), Restriction::Open),
    ];
    let stub = Arc::new(stub);

    let sessions = service(stub.clone())
        .available_visit_sessions(request())
        .await
        .expect("availability computes");

    assert_eq!(sessions.len(), 10);
    assert!(sessions.iter().all(|session| !session.session_for_review));
    assert!(sessions
        .windows(2)
        .all(|pair| pair[0].sort_key() <= pair[1].sort_key()));

    let requests = stub
        .recorded
        .session_requests
        .lock()
        .expect("session request mutex poisoned")
        .clone();
    assert_eq!(requests.len(), 1);
    let (prison_code, window, restriction) = requests[0].clone();
    assert_eq!(prison_code, "HEI");
    assert_eq!(window, DateRange::new(date(2026, 8, 5), date(2026, 8, 31)));
    assert_eq!(restriction, Restriction::Open);
}

#[tokio::test]
async fn closed_prisoner_restriction_overrides_requested_open() {
    let mut stub = StubCollaborators::default();
    stub.prisoner_closed = true;
    let stub = Arc::new(stub);

    let mut req = request();
    req.requested_restriction = Some(Restriction::Open);

    service(stub.clone())
        .available_visit_sessions(req)
        .await
        .expect("availability computes");

    let requests = stub
        .recorded
        .session_requests
        .lock()
        .expect("session request mutex poisoned")
        .clone();
    assert_eq!(requests[0].2, Restriction::Closed);
}

#[tokio::test]
async fn closed_visitor_restriction_forces_closed_sessions() {
    let mut stub = StubCollaborators::default();
    stub.visitors_closed = true;
    let stub = Arc::new(stub);

    let mut req = request();
    req.visitor_ids = vec![4321];

    service(stub.clone())
        .available_visit_sessions(req)
        .await
        .expect("availability computes");

    let requests = stub
        .recorded
        .session_requests
        .lock()
        .expect("session request mutex poisoned")
        .clone();
    assert_eq!(requests[0].2, Restriction::Closed);
}

#[tokio::test]
async fn visitor_ban_truncates_the_requested_window() {
    let mut stub = StubCollaborators::default();
    stub.legal_window = Some(Some(DateRange::new(date(2026, 8, 14), date(2026, 9, 30))));
    let stub = Arc::new(stub);

    let mut req = request();
    req.visitor_ids = vec![4321];

    service(stub.clone())
        .available_visit_sessions(req)
        .await
        .expect("availability computes");

    let requests = stub
        .recorded
        .session_requests
        .lock()
        .expect("session request mutex poisoned")
        .clone();
    assert_eq!(
        requests[0].1,
        DateRange::new(date(2026, 8, 14), date(2026, 8, 31))
    );
}

#[tokio::test]
async fn ban_covering_the_whole_window_yields_no_sessions() {
    let mut stub = StubCollaborators::default();
    stub.legal_window = Some(None);
    stub.sessions = vec![candidate(
        "sess-a",
        date(2026, 8, 10),
        (9, 0),
        (10, 0),
        Restriction::Open,
    )];
    let stub = Arc::new(stub);

    let mut req = request();
    req.visitor_ids = vec![4321];

    let sessions = service(stub.clone())
        .available_visit_sessions(req)
        .await
        .expect("empty result, not an error");

    assert!(sessions.is_empty());
    // The session source is never consulted for an empty window.
    assert!(stub
        .recorded
        .session_requests
        .lock()
        .expect("session request mutex poisoned")
        .is_empty());
}

#[tokio::test]
async fn missing_template_coverage_is_an_empty_result() {
    let mut stub = StubCollaborators::default();
    stub.no_valid_range = true;
    let stub = Arc::new(stub);

    let sessions = service(stub)
        .available_visit_sessions(request())
        .await
        .expect("empty result, not an error");

    assert!(sessions.is_empty());
}

#[tokio::test]
async fn unknown_prison_is_a_hard_error() {
    let stub = Arc::new(StubCollaborators::default());

    let mut req = request();
    req.prison_code = "XXX".to_string();

    let err = service(stub)
        .available_visit_sessions(req)
        .await
        .expect_err("unknown prison fails");

    assert!(matches!(err, AvailabilityError::UnknownPrison(code) if code == "XXX"));
}

#[tokio::test]
async fn prisoner_restriction_failure_fails_the_request() {
    let mut stub = StubCollaborators::default();
    stub.prisoner_restrictions_unavailable = true;
    let stub = Arc::new(stub);

    let err = service(stub)
        .available_visit_sessions(request())
        .await
        .expect_err("mandatory collaborator failure propagates");

    assert!(matches!(
        err,
        AvailabilityError::Collaborator {
            collaborator: "prisoner restrictions",
            ..
        }
    ));
}

#[tokio::test]
async fn best_effort_failures_degrade_to_empty_sets() {
    let mut stub = StubCollaborators::default();
    stub.sessions = vec![candidate(
        "sess-a",
        date(2026, 8, 10),
        (9, 0),
        (10, 0),
        Restriction::Open,
    )];
    stub.exclusions_unavailable = true;
    stub.holidays_unavailable = true;
    let stub = Arc::new(stub);

    let sessions = service(stub)
        .available_visit_sessions(request())
        .await
        .expect("soft failures never fail the request");

    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn appointment_failure_fails_the_request_when_checking() {
    let mut stub = StubCollaborators::default();
    stub.appointments_unavailable = true;
    let stub = Arc::new(stub);

    let err = service(stub)
        .available_visit_sessions(request())
        .await
        .expect_err("appointment feed is mandatory when checking");

    assert!(matches!(
        err,
        AvailabilityError::Collaborator {
            collaborator: "scheduled appointments",
            ..
        }
    ));
}

#[tokio::test]
async fn appointment_feed_is_never_consulted_when_opted_out() {
    let mut stub = StubCollaborators::default();
    stub.appointments_unavailable = true;
    stub.events = vec![appointment(
        date(2026, 8, 10),
        None,
        None,
        "APP",
        "MEDE",
    )];
    stub.sessions = vec![candidate(
        "sess-a",
        date(2026, 8, 10),
        (9, 0),
        (10, 0),
        Restriction::Open,
    )];
    let stub = Arc::new(stub);

    let mut req = request();
    req.appointment_check = false;

    let sessions = service(stub.clone())
        .available_visit_sessions(req)
        .await
        .expect("availability computes without the feed");

    assert_eq!(sessions.len(), 1);
    assert_eq!(
        *stub
            .recorded
            .appointment_calls
            .lock()
            .expect("appointment call mutex poisoned"),
        0
    );
}

#[tokio::test]
async fn duplicate_candidates_collapse_to_one_session() {
    let slot = candidate("sess-a", date(2026, 8, 10), (9, 0), (10, 0), Restriction::Open);
    let mut stub = StubCollaborators::default();
    stub.sessions = vec![slot.clone(), slot];
    let stub = Arc::new(stub);

    let sessions = service(stub)
        .available_visit_sessions(request())
        .await
        .expect("availability computes");

    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn out_of_window_candidates_from_the_source_are_dropped() {
    let mut stub = StubCollaborators::default();
    stub.sessions = vec![
        candidate("sess-a", date(2026, 8, 10), (9, 0), (10, 0), Restriction::Open),
        candidate("sess-a", date(2026, 9, 10), (9, 0), (10, 0), Restriction::Open),
    ];
    let stub = Arc::new(stub);

    let sessions = service(stub)
        .available_visit_sessions(request())
        .await
        .expect("availability computes");

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].date, date(2026, 8, 10));
}

#[tokio::test]
async fn repeated_calls_yield_identical_lists() {
    let mut stub = StubCollaborators::default();
    stub.sessions = vec![
        candidate("sess-b", date(2026, 8, 12), (14, 0), (16, 0), Restriction::Open),
        candidate("sess-a", date(2026, 8, 10), (9, 0), (10, 0), Restriction::Open),
    ];
    let stub = Arc::new(stub);
    let service = service(stub);

    let first = service
        .available_visit_sessions(request())
        .await
        .expect("first call computes");
    let second = service
        .available_visit_sessions(request())
        .await
        .expect("second call computes");

    assert_eq!(first, second);
}

struct SlowHolidays;

#[async_trait]
impl HolidaySource for SlowHolidays {
    async fn bank_holidays(&self) -> SourceResult<Vec<BankHoliday>> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn slow_best_effort_collaborators_are_cut_off_by_the_budget() {
    let mut stub = StubCollaborators::default();
    stub.sessions = vec![candidate(
        "sess-a",
        date(2026, 8, 10),
        (9, 0),
        (10, 0),
        Restriction::Open,
    )];
    let stub = Arc::new(stub);

    let mut collaborators = collaborators(stub);
    collaborators.holidays = Arc::new(SlowHolidays);

    let service = AvailabilityService::new(
        collaborators,
        AvailabilityPolicy::with_timeout(Duration::from_millis(20)),
    );

    let sessions = service
        .available_visit_sessions(request())
        .await
        .expect("timed-out holiday feed degrades to empty");

    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn timeout_error_names_the_budget() {
    let err = SourceError::Timeout(Duration::from_millis(20));
    assert!(err.to_string().contains("20ms"));
}
