use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use vodca::{AsRefln, Fromln};

use crate::entity::RentedAt;

/// How long an item may stay checked out.
pub const RENTAL_PERIOD: Duration = Duration::days(7);

/// Last instant at which a rental may still be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct DueDate(OffsetDateTime);

impl DueDate {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into())
    }

    pub fn of(rented_at: &RentedAt) -> Self {
        Self(*rented_at.as_ref() + RENTAL_PERIOD)
    }

    /// The return window is closed at both ends, so `now == due date` is still in time.
    pub fn has_passed(&self, now: OffsetDateTime) -> bool {
        self.0 < now
    }
}
