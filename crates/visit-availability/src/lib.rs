//! Booking-eligibility engine for prison social visits.
//!
//! Given a prisoner, a prison, and a candidate visitor set, the engine
//! produces the authoritative list of bookable visit sessions for the
//! booking window, each restricted to OPEN or CLOSED visiting and filtered
//! against higher-priority appointments, prison closure dates, and
//! manual-review windows.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
