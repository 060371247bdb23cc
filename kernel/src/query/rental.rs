use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{ItemId, RentalHistory, UserId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait RentalHistoryQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_open_by_user_and_item(
        &self,
        con: &mut Self::Transaction,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<RentalHistory>, KernelError>;

    /// Open rentals of a user, in the store's natural order.
    async fn find_open_by_user(
        &self,
        con: &mut Self::Transaction,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError>;

    /// Every rental of an item, open or returned, oldest first.
    async fn find_by_item_id(
        &self,
        con: &mut Self::Transaction,
        item_id: &ItemId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError>;
}

pub trait DependOnRentalHistoryQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type RentalHistoryQuery: RentalHistoryQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn rental_history_query(&self) -> &Self::RentalHistoryQuery;
}
