//! Prison-closure date filtering.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use super::super::domain::SessionCandidate;

/// Closure dates gathered for a prison: establishment-wide dates plus
/// template-scoped dates keyed by session template reference.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExclusionCalendar {
    pub(crate) prison_wide: BTreeSet<NaiveDate>,
    pub(crate) per_template: HashMap<String, BTreeSet<NaiveDate>>,
}

impl ExclusionCalendar {
    pub(crate) fn is_empty(&self) -> bool {
        self.prison_wide.is_empty() && self.per_template.is_empty()
    }

    fn excludes(&self, candidate: &SessionCandidate) -> bool {
        if self.prison_wide.contains(&candidate.date) {
            return true;
        }
        self.per_template
            .get(&candidate.session_template_ref)
            .is_some_and(|dates| dates.contains(&candidate.date))
    }
}

/// Drop candidates falling on a closure date. A template-scoped exclusion
/// only removes candidates of that template.
pub(crate) fn filter_excluded(
    candidates: Vec<SessionCandidate>,
    calendar: &ExclusionCalendar,
) -> Vec<SessionCandidate> {
    if calendar.is_empty() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|candidate| {
            if calendar.excludes(candidate) {
                debug!(
                    session_template_ref = %candidate.session_template_ref,
                    date = %candidate.date,
                    "dropping visit slot on a prison exclusion date"
                );
                false
            } else {
                true
            }
        })
        .collect()
}
