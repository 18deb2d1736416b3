use chrono::{Local, NaiveDate};
use clap::Args;
use visit_availability::error::AppError;
use visit_availability::workflows::visits::availability::{
    AvailabilityPolicy, AvailabilityRequest, AvailabilityService,
};
use visit_availability::workflows::visits::{PrisonerId, Restriction};

use crate::infra::{demo_collaborators, parse_date, parse_restriction};

#[derive(Args, Debug)]
pub(crate) struct AvailabilityArgs {
    /// Prison code to query (fixture prisons: HEI, BLI)
    #[arg(long, default_value = "HEI")]
    pub(crate) prison: String,
    /// Prisoner number (fixtures: A1234BC, B2345CD closed, C3456DE review)
    #[arg(long, default_value = "A1234BC")]
    pub(crate) prisoner: String,
    /// Visitor ids to include (fixtures: 1111 closed, 2222 banned, 3333 review)
    #[arg(long, value_delimiter = ',')]
    pub(crate) visitors: Vec<i64>,
    /// Requested restriction (OPEN or CLOSED)
    #[arg(long, value_parser = parse_restriction)]
    pub(crate) restriction: Option<Restriction>,
    /// Leave appointment clashes in place instead of removing them
    #[arg(long)]
    pub(crate) skip_appointment_check: bool,
    /// Reference date for the booking window (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run_availability(args: AvailabilityArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let service = AvailabilityService::new(demo_collaborators(today), AvailabilityPolicy::default());

    let request = AvailabilityRequest {
        prison_code: args.prison.clone(),
        prisoner_id: PrisonerId(args.prisoner.clone()),
        requested_restriction: args.restriction,
        visitor_ids: args.visitors.clone(),
        appointment_check: !args.skip_appointment_check,
        today: Some(today),
    };

    let sessions = service.available_visit_sessions(request).await?;

    println!(
        "Bookable visit sessions for {} at {} (as of {})",
        args.prisoner, args.prison, today
    );
    if sessions.is_empty() {
        println!("  none");
        return Ok(());
    }

    for session in &sessions {
        println!(
            "  {}  {}-{}  {:<6}  {}{}",
            session.date,
            session.time_slot.start_time.format("%H:%M"),
            session.time_slot.end_time.format("%H:%M"),
            session.restriction.label(),
            session.session_template_ref,
            if session.session_for_review {
                "  [review]"
            } else {
                ""
            }
        );
    }
    println!("  {} session(s)", sessions.len());

    Ok(())
}
