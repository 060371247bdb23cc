use std::ops::{Deref, DerefMut};

use error_stack::{Report, ResultExt};
use sqlx::{Error, PgConnection, Pool, Postgres};

use kernel::interface::clock::DependOnClock;
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{DependOnItemQuery, DependOnRentalHistoryQuery};
use kernel::interface::update::{DependOnItemModifier, DependOnRentalHistoryModifier};
use kernel::KernelError;

use crate::clock::SystemClock;
use crate::env;
use crate::error::ConvertError;

pub use self::{item::*, rental::*};

mod item;
mod rental;

static POSTGRES_URL: &str = "POSTGRES_URL";

/// Connects to `POSTGRES_URL` and applies `driver/migrations` before handing out transactions.
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
    clock: SystemClock,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let pool = Pool::connect(&url).await.convert_error()?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable("Failed to apply migrations")?;
        Ok(Self {
            pool,
            clock: SystemClock,
        })
    }
}

impl Clone for PostgresDatabase {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: self.clock,
        }
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let transaction = self.pool.begin().await.convert_error()?;
        Ok(PostgresTransaction(transaction))
    }
}

pub struct PostgresTransaction(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresTransaction {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl DependOnClock for PostgresDatabase {
    type Clock = SystemClock;
    fn clock(&self) -> &Self::Clock {
        &self.clock
    }
}

impl DependOnItemQuery for PostgresDatabase {
    type ItemQuery = PostgresItemRepository;
    fn item_query(&self) -> &Self::ItemQuery {
        &PostgresItemRepository
    }
}

impl DependOnItemModifier for PostgresDatabase {
    type ItemModifier = PostgresItemRepository;
    fn item_modifier(&self) -> &Self::ItemModifier {
        &PostgresItemRepository
    }
}

impl DependOnRentalHistoryQuery for PostgresDatabase {
    type RentalHistoryQuery = PostgresRentalHistoryRepository;
    fn rental_history_query(&self) -> &Self::RentalHistoryQuery {
        &PostgresRentalHistoryRepository
    }
}

impl DependOnRentalHistoryModifier for PostgresDatabase {
    type RentalHistoryModifier = PostgresRentalHistoryRepository;
    fn rental_history_modifier(&self) -> &Self::RentalHistoryModifier {
        &PostgresRentalHistoryRepository
    }
}

impl<T> ConvertError for Result<T, Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = match &error {
                Error::PoolTimedOut => KernelError::Timeout,
                // Raised by the one-open-rental-per-item index when a write races past the lock.
                Error::Database(db) if db.is_unique_violation() => KernelError::Conflict,
                _ => KernelError::Internal,
            };
            Report::from(error).change_context(context)
        })
    }
}
