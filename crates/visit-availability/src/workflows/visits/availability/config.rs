use std::collections::BTreeSet;
use std::time::Duration;

/// Scheduled-event sub-types that outrank a social visit. Medical and legal
/// appointment codes from the offender scheduling feed.
const DEFAULT_HIGHER_PRIORITY_SUB_TYPES: [&str; 6] =
    ["MEDE", "MEDO", "MEOT", "CALA", "LACO", "VLLA"];

const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_millis(3_000);

/// How far a bank holiday pushes availability out when review mode is
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidayEmbargo {
    /// Every date up to and including the latest in-window holiday is
    /// withheld, so the first reviewable slot lands after the holiday run.
    ThroughHoliday,
    /// Only the holiday dates themselves are withheld.
    HolidayOnly,
}

/// Policy dials for the availability engine.
#[derive(Debug, Clone)]
pub struct AvailabilityPolicy {
    /// Budget applied to each collaborator call in the fan-out.
    pub collaborator_timeout: Duration,
    /// `APP` event sub-types treated as higher priority than a visit.
    pub higher_priority_sub_types: BTreeSet<String>,
    /// Holiday handling while a review condition is active.
    pub holiday_embargo: HolidayEmbargo,
}

impl AvailabilityPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            collaborator_timeout: timeout,
            ..Self::default()
        }
    }
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        Self {
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            higher_priority_sub_types: DEFAULT_HIGHER_PRIORITY_SUB_TYPES
                .iter()
                .map(|code| (*code).to_string())
                .collect(),
            holiday_embargo: HolidayEmbargo::ThroughHoliday,
        }
    }
}
