mod due_date;
mod id;
mod rented_at;
mod returned_at;
mod status;

pub use self::{due_date::*, id::*, rented_at::*, returned_at::*, status::*};
use crate::entity::{ItemId, UserId};
use crate::KernelError;
use destructure::Destructure;
use error_stack::Report;
use time::OffsetDateTime;
use uuid::Uuid;
use vodca::References;

/// One checkout of an item by a user. Records are append-only: they are created open
/// and closed exactly once by [`RentalHistory::mark_returned`].
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct RentalHistory {
    id: RentalHistoryId,
    user_id: UserId,
    item_id: ItemId,
    rented_at: RentedAt,
    returned_at: Option<ReturnedAt>,
}

impl RentalHistory {
    pub fn new(
        id: RentalHistoryId,
        user_id: UserId,
        item_id: ItemId,
        rented_at: RentedAt,
        returned_at: Option<ReturnedAt>,
    ) -> Self {
        Self {
            id,
            user_id,
            item_id,
            rented_at,
            returned_at,
        }
    }

    pub fn open(user_id: UserId, item_id: ItemId, rented_at: RentedAt) -> Self {
        Self::new(
            RentalHistoryId::new(Uuid::new_v4()),
            user_id,
            item_id,
            rented_at,
            None,
        )
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn due_date(&self) -> DueDate {
        DueDate::of(&self.rented_at)
    }

    pub fn status_at(&self, now: OffsetDateTime) -> RentalStatus {
        RentalStatus::evaluate(&self.due_date(), self.returned_at.as_ref(), now)
    }

    pub fn is_returnable_at(&self, now: OffsetDateTime) -> bool {
        self.is_open() && !self.due_date().has_passed(now)
    }

    pub fn mark_returned(self, now: OffsetDateTime) -> error_stack::Result<Self, KernelError> {
        if !self.is_open() {
            return Err(Report::new(KernelError::Conflict)
                .attach_printable(format!("rental {} is already returned", self.id.as_ref())));
        }
        if now < *self.rented_at.as_ref() {
            return Err(Report::new(KernelError::Conflict).attach_printable(format!(
                "return time {now} precedes rental start {}",
                self.rented_at.as_ref()
            )));
        }
        Ok(Self {
            returned_at: Some(ReturnedAt::new(now)),
            ..self
        })
    }
}

#[cfg(test)]
mod test {
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    use crate::entity::{ItemId, RentalHistory, RentalStatus, RentedAt, UserId, RENTAL_PERIOD};
    use crate::KernelError;

    fn history() -> RentalHistory {
        RentalHistory::open(
            UserId::new("U1"),
            ItemId::new(1),
            RentedAt::new(datetime!(2024-03-01 09:00 UTC)),
        )
    }

    #[test]
    fn due_date_is_seven_days_after_rental() {
        let history = history();
        assert_eq!(
            history.due_date().as_ref(),
            &datetime!(2024-03-08 09:00 UTC)
        );
        assert_eq!(RENTAL_PERIOD, Duration::days(7));
    }

    #[test]
    fn status_counts_whole_days_left() {
        let history = history();
        let rented_at = *history.rented_at().as_ref();

        let status = history.status_at(rented_at);
        assert_eq!(status, RentalStatus::Remaining { days_left: 7 });

        let status = history.status_at(rented_at + Duration::days(5));
        assert_eq!(status.days_left(), 2);
        assert_eq!(status.to_string(), "2 days remaining");

        let status = history.status_at(rented_at + Duration::days(5) + Duration::hours(1));
        assert_eq!(status.days_left(), 1);
    }

    #[test]
    fn status_reports_overdue_without_negative_days() {
        let history = history();
        let due = *history.due_date().as_ref();

        let at_due = history.status_at(due);
        assert_eq!(at_due, RentalStatus::Remaining { days_left: 0 });

        let late = history.status_at(due + Duration::seconds(1));
        assert_eq!(late, RentalStatus::Overdue);
        assert_eq!(late.days_left(), 0);
        assert_eq!(late.to_string(), "return window passed");

        let barely_late = history.status_at(due + Duration::milliseconds(500));
        assert_eq!(barely_late, RentalStatus::Overdue);
        assert!(!history.is_returnable_at(due + Duration::milliseconds(500)));

        let just_in_time = history.status_at(due - Duration::milliseconds(500));
        assert_eq!(just_in_time, RentalStatus::Remaining { days_left: 0 });
        assert!(history.is_returnable_at(due - Duration::milliseconds(500)));

        let very_late = history.status_at(due + Duration::days(30));
        assert_eq!(very_late.days_left(), 0);
    }

    #[test]
    fn returned_rental_reports_returned() {
        let history = history();
        let rented_at = *history.rented_at().as_ref();
        let returned = history.mark_returned(rented_at + Duration::days(1)).unwrap();
        let status = returned.status_at(rented_at + Duration::days(20));
        assert_eq!(status, RentalStatus::Returned);
        assert_eq!(status.to_string(), "returned");
    }

    #[test]
    fn return_window_is_closed_at_both_ends() {
        let history = history();
        let due = *history.due_date().as_ref();
        assert!(history.is_returnable_at(*history.rented_at().as_ref()));
        assert!(history.is_returnable_at(due - Duration::seconds(1)));
        assert!(history.is_returnable_at(due));
        assert!(!history.is_returnable_at(due + Duration::seconds(1)));
    }

    #[test]
    fn mark_returned_happens_once() {
        let history = history();
        let rented_at = *history.rented_at().as_ref();

        let returned = history
            .clone()
            .mark_returned(rented_at + Duration::hours(3))
            .unwrap();
        assert!(!returned.is_open());
        let returned_at = returned.clone().into_destruct().returned_at;
        assert_eq!(
            returned_at.map(OffsetDateTime::from),
            Some(rented_at + Duration::hours(3))
        );

        let again = returned.mark_returned(rented_at + Duration::hours(4));
        assert_eq!(again.unwrap_err().current_context(), &KernelError::Conflict);

        let before_start = history.mark_returned(rented_at - Duration::seconds(1));
        assert_eq!(
            before_start.unwrap_err().current_context(),
            &KernelError::Conflict
        );
    }
}
