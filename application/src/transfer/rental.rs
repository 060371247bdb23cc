use time::OffsetDateTime;
use uuid::Uuid;

use kernel::prelude::entity::{DestructRentalHistory, Item, RentalHistory};

pub struct RentItemDto {
    pub user_id: String,
    pub item_id: i64,
}

pub struct ReturnItemDto {
    pub user_id: String,
    pub item_id: i64,
}

pub struct GetOpenRentalsDto {
    pub user_id: String,
    /// Display label echoed into every status verbatim.
    pub role: String,
}

pub struct GetItemHistoryDto {
    pub item_id: i64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RentalStatusDto {
    pub item_id: i64,
    pub item_name: String,
    pub user_id: String,
    pub role: String,
    pub rented_at: OffsetDateTime,
    pub due_date: OffsetDateTime,
    pub returned_at: Option<OffsetDateTime>,
    pub days_left: i64,
    pub status_message: String,
}

impl RentalStatusDto {
    pub fn new(item: &Item, history: RentalHistory, role: &str, now: OffsetDateTime) -> Self {
        let status = history.status_at(now);
        let due_date = history.due_date();
        let DestructRentalHistory {
            user_id,
            item_id,
            rented_at,
            returned_at,
            ..
        } = history.into_destruct();
        Self {
            item_id: item_id.into(),
            item_name: item.name().as_ref().clone(),
            user_id: user_id.into(),
            role: role.to_string(),
            rented_at: rented_at.into(),
            due_date: due_date.into(),
            returned_at: returned_at.map(Into::into),
            days_left: status.days_left(),
            status_message: status.to_string(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RentalHistoryDto {
    pub id: Uuid,
    pub user_id: String,
    pub item_id: i64,
    pub rented_at: OffsetDateTime,
    pub returned_at: Option<OffsetDateTime>,
}

impl From<RentalHistory> for RentalHistoryDto {
    fn from(value: RentalHistory) -> Self {
        let DestructRentalHistory {
            id,
            user_id,
            item_id,
            rented_at,
            returned_at,
        } = value.into_destruct();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            item_id: item_id.into(),
            rented_at: rented_at.into(),
            returned_at: returned_at.map(Into::into),
        }
    }
}
