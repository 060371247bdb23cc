use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::RentalHistory;
use crate::KernelError;

#[async_trait::async_trait]
pub trait RentalHistoryModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnRentalHistoryModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type RentalHistoryModifier: RentalHistoryModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn rental_history_modifier(&self) -> &Self::RentalHistoryModifier;
}
