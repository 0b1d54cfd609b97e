//! Rest-interval tracking: replays movement events as a two-state machine.

use chrono::NaiveDate;

use crate::MoveEvent;

/// State after replaying events up to some date. The only memory kept is
/// the start of the current free interval, when it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestState {
    NoHistory,
    Occupied,
    Free { since: Option<NaiveDate> },
}

impl RestState {
    #[must_use]
    pub fn step(self, event: &MoveEvent) -> Self {
        if event.is_occupied() {
            return RestState::Occupied;
        }
        match self {
            RestState::Occupied => RestState::Free {
                since: Some(event.date),
            },
            RestState::Free { since } => RestState::Free { since },
            // Free from the first event on: when the interval began is unknown.
            RestState::NoHistory => RestState::Free { since: None },
        }
    }
}

/// Replays every event dated at or before `date`.
pub fn replay(events: &[MoveEvent], date: NaiveDate) -> RestState {
    let end = events.partition_point(|e| e.date <= date);
    events[..end]
        .iter()
        .fold(RestState::NoHistory, RestState::step)
}

/// Whole rest days as of `date`, counting the day the free interval began.
/// `Some(0)` while occupied, `None` when the history cannot tell.
pub fn rest_days(events: &[MoveEvent], date: NaiveDate) -> Option<i64> {
    match replay(events, date) {
        RestState::Occupied => Some(0),
        RestState::Free { since: Some(start) } => Some(((date - start).num_days() + 1).max(0)),
        RestState::Free { since: None } | RestState::NoHistory => None,
    }
}
