use error_stack::Report;

use kernel::interface::clock::{Clock, DependOnClock};
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};
use kernel::interface::query::{
    DependOnItemQuery, DependOnRentalHistoryQuery, ItemQuery, RentalHistoryQuery,
};
use kernel::interface::update::{
    DependOnItemModifier, DependOnRentalHistoryModifier, ItemModifier, RentalHistoryModifier,
};
use kernel::prelude::entity::{IsRented, ItemId, RentalHistory, RentedAt, UserId};
use kernel::KernelError;

use crate::transaction::settle;
use crate::transfer::{
    GetItemHistoryDto, GetOpenRentalsDto, RentItemDto, RentalHistoryDto, RentalStatusDto,
    ReturnItemDto,
};

fn item_not_found(item_id: &ItemId) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(format!(
        "item {} does not exist",
        item_id.as_ref()
    ))
}

#[async_trait::async_trait]
pub trait RentItemService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnClock
    + DependOnItemQuery
    + DependOnItemModifier
    + DependOnRentalHistoryQuery
    + DependOnRentalHistoryModifier
{
    async fn rent_item(&self, dto: RentItemDto) -> error_stack::Result<(), KernelError> {
        let user_id = UserId::validated(dto.user_id)?;
        let item_id = ItemId::new(dto.item_id);

        let mut connection = self.database_connection().transact().await?;
        let now = self.clock().now();

        let outcome: error_stack::Result<(), KernelError> = async {
            let item = self
                .item_query()
                .find_for_update(&mut connection, &item_id)
                .await?
                .ok_or_else(|| item_not_found(&item_id))?;

            if *item.is_rented().as_ref() {
                tracing::warn!(item = *item_id.as_ref(), "rent rejected: already rented");
                return Err(Report::new(KernelError::Conflict).attach_printable(format!(
                    "item {} is already rented",
                    item_id.as_ref()
                )));
            }

            let unreturned = self
                .rental_history_query()
                .find_open_by_user_and_item(&mut connection, &user_id, &item_id)
                .await?;
            if unreturned.is_some() {
                tracing::warn!(
                    user = %user_id.as_ref(),
                    item = *item_id.as_ref(),
                    "rent rejected: unreturned duplicate"
                );
                return Err(Report::new(KernelError::Conflict).attach_printable(format!(
                    "user {} has an unreturned duplicate rental of item {}",
                    user_id.as_ref(),
                    item_id.as_ref()
                )));
            }

            let item = item.reconstruct(|i| i.is_rented = IsRented::new(true));
            self.item_modifier().update(&mut connection, &item).await?;

            let history = RentalHistory::open(user_id.clone(), item_id, RentedAt::new(now));
            self.rental_history_modifier()
                .create(&mut connection, &history)
                .await?;
            Ok(())
        }
        .await;

        settle(connection, outcome).await?;
        tracing::info!(user = %user_id.as_ref(), item = *item_id.as_ref(), "item rented");
        Ok(())
    }
}

impl<T> RentItemService for T where
    T: DependOnDatabaseConnection
        + DependOnClock
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnRentalHistoryQuery
        + DependOnRentalHistoryModifier
{
}

#[async_trait::async_trait]
pub trait ReturnItemService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnClock
    + DependOnItemQuery
    + DependOnItemModifier
    + DependOnRentalHistoryQuery
    + DependOnRentalHistoryModifier
{
    /// Closes the open rental of `dto.user_id` for `dto.item_id`.
    ///
    /// Returns are refused once the due date has passed. Such an item stays rented until it
    /// is released by some process outside of this service.
    async fn return_item(&self, dto: ReturnItemDto) -> error_stack::Result<(), KernelError> {
        let user_id = UserId::validated(dto.user_id)?;
        let item_id = ItemId::new(dto.item_id);

        let mut connection = self.database_connection().transact().await?;
        let now = self.clock().now();

        let outcome: error_stack::Result<(), KernelError> = async {
            let item = self
                .item_query()
                .find_for_update(&mut connection, &item_id)
                .await?
                .ok_or_else(|| item_not_found(&item_id))?;

            let history = self
                .rental_history_query()
                .find_open_by_user_and_item(&mut connection, &user_id, &item_id)
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound).attach_printable(format!(
                        "no rental record of item {} for user {}",
                        item_id.as_ref(),
                        user_id.as_ref()
                    ))
                })?;

            if !history.is_returnable_at(now) {
                let due_date = history.due_date();
                tracing::warn!(
                    user = %user_id.as_ref(),
                    item = *item_id.as_ref(),
                    due = %due_date.as_ref(),
                    "return rejected: return window expired"
                );
                return Err(Report::new(KernelError::Conflict).attach_printable(format!(
                    "return window expired at {}",
                    due_date.as_ref()
                )));
            }

            let item = item.reconstruct(|i| i.is_rented = IsRented::new(false));
            self.item_modifier().update(&mut connection, &item).await?;

            let history = history.mark_returned(now)?;
            self.rental_history_modifier()
                .update(&mut connection, &history)
                .await?;
            Ok(())
        }
        .await;

        settle(connection, outcome).await?;
        tracing::info!(user = %user_id.as_ref(), item = *item_id.as_ref(), "item returned");
        Ok(())
    }
}

impl<T> ReturnItemService for T where
    T: DependOnDatabaseConnection
        + DependOnClock
        + DependOnItemQuery
        + DependOnItemModifier
        + DependOnRentalHistoryQuery
        + DependOnRentalHistoryModifier
{
}

#[async_trait::async_trait]
pub trait GetOpenRentalsService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnClock
    + DependOnItemQuery
    + DependOnRentalHistoryQuery
{
    async fn get_open_rentals(
        &self,
        dto: GetOpenRentalsDto,
    ) -> error_stack::Result<Vec<RentalStatusDto>, KernelError> {
        let GetOpenRentalsDto { user_id, role } = dto;
        let user_id = UserId::new(user_id);

        let mut connection = self.database_connection().transact().await?;
        let now = self.clock().now();

        let outcome: error_stack::Result<Vec<RentalStatusDto>, KernelError> = async {
            let histories = self
                .rental_history_query()
                .find_open_by_user(&mut connection, &user_id)
                .await?;

            let mut statuses = Vec::with_capacity(histories.len());
            for history in histories {
                let item = self
                    .item_query()
                    .find_by_id(&mut connection, history.item_id())
                    .await?
                    .ok_or_else(|| {
                        Report::new(KernelError::Internal).attach_printable(format!(
                            "rental {} refers to missing item {}",
                            history.id().as_ref(),
                            history.item_id().as_ref()
                        ))
                    })?;
                statuses.push(RentalStatusDto::new(&item, history, &role, now));
            }
            Ok(statuses)
        }
        .await;

        settle(connection, outcome).await
    }
}

impl<T> GetOpenRentalsService for T where
    T: DependOnDatabaseConnection + DependOnClock + DependOnItemQuery + DependOnRentalHistoryQuery
{
}

#[async_trait::async_trait]
pub trait GetItemHistoryService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnItemQuery
    + DependOnRentalHistoryQuery
{
    async fn get_item_history(
        &self,
        dto: GetItemHistoryDto,
    ) -> error_stack::Result<Vec<RentalHistoryDto>, KernelError> {
        let item_id = ItemId::new(dto.item_id);

        let mut connection = self.database_connection().transact().await?;

        let outcome: error_stack::Result<Vec<RentalHistoryDto>, KernelError> = async {
            self.item_query()
                .find_by_id(&mut connection, &item_id)
                .await?
                .ok_or_else(|| item_not_found(&item_id))?;

            let histories = self
                .rental_history_query()
                .find_by_item_id(&mut connection, &item_id)
                .await?;
            Ok(histories.into_iter().map(RentalHistoryDto::from).collect())
        }
        .await;

        settle(connection, outcome).await
    }
}

impl<T> GetItemHistoryService for T where
    T: DependOnDatabaseConnection + DependOnItemQuery + DependOnRentalHistoryQuery
{
}

/// Rent, return and open rental listing behind one bound.
pub trait RentalLifecycleManager:
    RentItemService + ReturnItemService + GetOpenRentalsService
{
}

impl<T> RentalLifecycleManager for T where
    T: RentItemService + ReturnItemService + GetOpenRentalsService
{
}
