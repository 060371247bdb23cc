use std::collections::BTreeMap;
use std::sync::Arc;

use error_stack::Report;
use tokio::sync::{Mutex, OwnedMutexGuard};

use kernel::interface::clock::{Clock, DependOnClock};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{
    DependOnItemQuery, DependOnRentalHistoryQuery, ItemQuery, RentalHistoryQuery,
};
use kernel::interface::update::{
    DependOnItemModifier, DependOnRentalHistoryModifier, ItemModifier, RentalHistoryModifier,
};
use kernel::prelude::entity::{Item, ItemId, RentalHistory, UserId};
use kernel::KernelError;

use crate::clock::SystemClock;

#[derive(Debug, Clone, Default)]
struct MemoryStore {
    items: BTreeMap<ItemId, Item>,
    /// Insertion order is the natural order of the store.
    histories: Vec<RentalHistory>,
}

/// Process-local database. A transaction holds the whole store exclusively and works on a
/// private copy, so concurrent rentals are serialized and a failed one leaves no trace.
pub struct InMemoryDatabase<C = SystemClock> {
    store: Arc<Mutex<MemoryStore>>,
    clock: C,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryDatabase<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            store: Arc::new(Mutex::new(MemoryStore::default())),
            clock,
        }
    }
}

impl<C: Clone> Clone for InMemoryDatabase<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
        }
    }
}

#[async_trait::async_trait]
impl<C: Clock> DatabaseConnection for InMemoryDatabase<C> {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let guard = Arc::clone(&self.store).lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction { guard, working })
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryStore>,
    working: MemoryStore,
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

impl<C: Clock> DependOnClock for InMemoryDatabase<C> {
    type Clock = C;
    fn clock(&self) -> &Self::Clock {
        &self.clock
    }
}

impl<C: Clock> DependOnItemQuery for InMemoryDatabase<C> {
    type ItemQuery = InMemoryItemRepository;
    fn item_query(&self) -> &Self::ItemQuery {
        &InMemoryItemRepository
    }
}

impl<C: Clock> DependOnItemModifier for InMemoryDatabase<C> {
    type ItemModifier = InMemoryItemRepository;
    fn item_modifier(&self) -> &Self::ItemModifier {
        &InMemoryItemRepository
    }
}

impl<C: Clock> DependOnRentalHistoryQuery for InMemoryDatabase<C> {
    type RentalHistoryQuery = InMemoryRentalHistoryRepository;
    fn rental_history_query(&self) -> &Self::RentalHistoryQuery {
        &InMemoryRentalHistoryRepository
    }
}

impl<C: Clock> DependOnRentalHistoryModifier for InMemoryDatabase<C> {
    type RentalHistoryModifier = InMemoryRentalHistoryRepository;
    fn rental_history_modifier(&self) -> &Self::RentalHistoryModifier {
        &InMemoryRentalHistoryRepository
    }
}

pub struct InMemoryItemRepository;

#[async_trait::async_trait]
impl ItemQuery for InMemoryItemRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        Ok(con.working.items.get(id).cloned())
    }

    async fn find_for_update(
        &self,
        con: &mut InMemoryTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        // The transaction already owns the whole store.
        self.find_by_id(con, id).await
    }
}

#[async_trait::async_trait]
impl ItemModifier for InMemoryItemRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        item: &Item,
    ) -> error_stack::Result<(), KernelError> {
        if con.working.items.contains_key(item.id()) {
            return Err(Report::new(KernelError::Conflict)
                .attach_printable(format!("item {} already exists", item.id().as_ref())));
        }
        con.working.items.insert(*item.id(), item.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        item: &Item,
    ) -> error_stack::Result<(), KernelError> {
        match con.working.items.get_mut(item.id()) {
            Some(stored) => {
                *stored = item.clone();
                tracing::debug!(item = *item.id().as_ref(), "item updated");
                Ok(())
            }
            None => Err(Report::new(KernelError::Internal)
                .attach_printable(format!("item {} is not stored", item.id().as_ref()))),
        }
    }
}

pub struct InMemoryRentalHistoryRepository;

#[async_trait::async_trait]
impl RentalHistoryQuery for InMemoryRentalHistoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_open_by_user_and_item(
        &self,
        con: &mut InMemoryTransaction,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<RentalHistory>, KernelError> {
        Ok(con
            .working
            .histories
            .iter()
            .find(|h| h.is_open() && h.user_id() == user_id && h.item_id() == item_id)
            .cloned())
    }

    async fn find_open_by_user(
        &self,
        con: &mut InMemoryTransaction,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError> {
        Ok(con
            .working
            .histories
            .iter()
            .filter(|h| h.is_open() && h.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_item_id(
        &self,
        con: &mut InMemoryTransaction,
        item_id: &ItemId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError> {
        let mut found = con
            .working
            .histories
            .iter()
            .filter(|h| h.item_id() == item_id)
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|h| *h.rented_at().as_ref());
        Ok(found)
    }
}

#[async_trait::async_trait]
impl RentalHistoryModifier for InMemoryRentalHistoryRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError> {
        if con.working.histories.iter().any(|h| h.id() == history.id()) {
            return Err(Report::new(KernelError::Conflict).attach_printable(format!(
                "rental {} already exists",
                history.id().as_ref()
            )));
        }
        con.working.histories.push(history.clone());
        tracing::debug!(rental = %history.id().as_ref(), "rental history created");
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError> {
        match con
            .working
            .histories
            .iter_mut()
            .find(|h| h.id() == history.id())
        {
            Some(stored) => {
                *stored = history.clone();
                tracing::debug!(rental = %history.id().as_ref(), "rental history updated");
                Ok(())
            }
            None => Err(Report::new(KernelError::Internal).attach_printable(format!(
                "rental {} is not stored",
                history.id().as_ref()
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use time::macros::datetime;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::{ItemQuery, RentalHistoryQuery};
    use kernel::interface::update::{ItemModifier, RentalHistoryModifier};
    use kernel::prelude::entity::{
        IsRented, Item, ItemId, ItemName, RentalHistory, RentedAt, UserId,
    };
    use kernel::KernelError;

    use crate::database::{
        InMemoryDatabase, InMemoryItemRepository, InMemoryRentalHistoryRepository,
    };

    fn item(id: i64) -> Item {
        Item::new(ItemId::new(id), ItemName::new("Kayak"), IsRented::new(false))
    }

    #[tokio::test]
    async fn commit_publishes_writes() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        InMemoryItemRepository.create(&mut con, &item(1)).await?;
        con.commit().await?;

        let mut con = db.transact().await?;
        let found = InMemoryItemRepository
            .find_by_id(&mut con, &ItemId::new(1))
            .await?;
        assert_eq!(found, Some(item(1)));
        Ok(())
    }

    #[tokio::test]
    async fn roll_back_discards_writes() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        InMemoryItemRepository.create(&mut con, &item(1)).await?;
        con.roll_back().await?;

        let mut con = db.transact().await?;
        InMemoryItemRepository.create(&mut con, &item(2)).await?;
        drop(con);

        let mut con = db.transact().await?;
        for id in [1, 2] {
            let found = InMemoryItemRepository
                .find_by_id(&mut con, &ItemId::new(id))
                .await?;
            assert!(found.is_none());
        }
        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_rows_fails() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        let report = InMemoryItemRepository
            .update(&mut con, &item(7))
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Internal);

        let history = RentalHistory::open(
            UserId::new("U1"),
            ItemId::new(7),
            RentedAt::new(datetime!(2024-01-01 0:00 UTC)),
        );
        let report = InMemoryRentalHistoryRepository
            .update(&mut con, &history)
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Internal);
        Ok(())
    }

    #[tokio::test]
    async fn open_rental_queries() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        let user = UserId::new("U1");
        let first = RentalHistory::open(
            user.clone(),
            ItemId::new(1),
            RentedAt::new(datetime!(2024-01-02 0:00 UTC)),
        );
        let second = RentalHistory::open(
            user.clone(),
            ItemId::new(2),
            RentedAt::new(datetime!(2024-01-01 0:00 UTC)),
        );
        InMemoryRentalHistoryRepository
            .create(&mut con, &first)
            .await?;
        InMemoryRentalHistoryRepository
            .create(&mut con, &second)
            .await?;

        let open = InMemoryRentalHistoryRepository
            .find_open_by_user(&mut con, &user)
            .await?;
        assert_eq!(open, vec![first.clone(), second.clone()]);

        let returned = first
            .clone()
            .mark_returned(datetime!(2024-01-03 0:00 UTC))?;
        InMemoryRentalHistoryRepository
            .update(&mut con, &returned)
            .await?;

        let open = InMemoryRentalHistoryRepository
            .find_open_by_user_and_item(&mut con, &user, &ItemId::new(1))
            .await?;
        assert!(open.is_none());
        let open = InMemoryRentalHistoryRepository
            .find_open_by_user(&mut con, &user)
            .await?;
        assert_eq!(open, vec![second]);

        let all = InMemoryRentalHistoryRepository
            .find_by_item_id(&mut con, &ItemId::new(1))
            .await?;
        assert_eq!(all, vec![returned]);
        Ok(())
    }
}
