//! OPEN versus CLOSED resolution for a prisoner and candidate visitor set.

use super::super::domain::Restriction;

/// Signals gathered from the restriction collaborators before resolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RestrictionSignals {
    pub(crate) prisoner_closed: bool,
    pub(crate) visitors_closed: bool,
}

/// A closed restriction on the prisoner or on any visitor forces CLOSED
/// visiting; otherwise the caller's requested restriction is honoured, with
/// OPEN as the permissive default.
pub(crate) fn resolve(
    signals: RestrictionSignals,
    requested: Option<Restriction>,
) -> Restriction {
    if signals.prisoner_closed || signals.visitors_closed {
        return Restriction::Closed;
    }
    requested.unwrap_or(Restriction::Open)
}
