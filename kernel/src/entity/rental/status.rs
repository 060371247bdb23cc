use std::fmt::{Display, Formatter};

use time::OffsetDateTime;

use crate::entity::{DueDate, ReturnedAt};

/// Display status of a rental, derived from its due date and the current time.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RentalStatus {
    Remaining { days_left: i64 },
    Overdue,
    Returned,
}

impl RentalStatus {
    pub fn evaluate(
        due_date: &DueDate,
        returned_at: Option<&ReturnedAt>,
        now: OffsetDateTime,
    ) -> Self {
        if returned_at.is_some() {
            return Self::Returned;
        }
        // Same predicate as the return window, so a refused return always reads as overdue.
        if due_date.has_passed(now) {
            return Self::Overdue;
        }
        let remaining = *due_date.as_ref() - now;
        Self::Remaining {
            days_left: remaining.whole_days(),
        }
    }

    /// Whole days until the due date, never negative.
    pub fn days_left(&self) -> i64 {
        match self {
            Self::Remaining { days_left } => *days_left,
            Self::Overdue | Self::Returned => 0,
        }
    }
}

impl Display for RentalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remaining { days_left } => write!(f, "{days_left} days remaining"),
            Self::Overdue => write!(f, "return window passed"),
            Self::Returned => write!(f, "returned"),
        }
    }
}
