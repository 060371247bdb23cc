use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::RentalHistoryQuery;
use kernel::interface::update::RentalHistoryModifier;
use kernel::prelude::entity::{
    DestructRentalHistory, ItemId, RentalHistory, RentalHistoryId, RentedAt, ReturnedAt, UserId,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresRentalHistoryRepository;

#[async_trait::async_trait]
impl RentalHistoryQuery for PostgresRentalHistoryRepository {
    type Transaction = PostgresTransaction;

    async fn find_open_by_user_and_item(
        &self,
        con: &mut PostgresTransaction,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<RentalHistory>, KernelError> {
        PgRentalHistoryInternal::find_open_by_user_and_item(con, user_id, item_id).await
    }

    async fn find_open_by_user(
        &self,
        con: &mut PostgresTransaction,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError> {
        PgRentalHistoryInternal::find_open_by_user(con, user_id).await
    }

    async fn find_by_item_id(
        &self,
        con: &mut PostgresTransaction,
        item_id: &ItemId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError> {
        PgRentalHistoryInternal::find_by_item_id(con, item_id).await
    }
}

#[async_trait::async_trait]
impl RentalHistoryModifier for PostgresRentalHistoryRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError> {
        PgRentalHistoryInternal::create(con, history).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError> {
        PgRentalHistoryInternal::update(con, history).await
    }
}

#[derive(sqlx::FromRow)]
struct RentalHistoryRow {
    id: Uuid,
    user_id: String,
    item_id: i64,
    rented_at: OffsetDateTime,
    returned_at: Option<OffsetDateTime>,
}

impl From<RentalHistoryRow> for RentalHistory {
    fn from(value: RentalHistoryRow) -> Self {
        RentalHistory::new(
            RentalHistoryId::new(value.id),
            UserId::new(value.user_id),
            ItemId::new(value.item_id),
            RentedAt::new(value.rented_at),
            value.returned_at.map(ReturnedAt::new),
        )
    }
}

impl From<&RentalHistory> for RentalHistoryRow {
    fn from(value: &RentalHistory) -> Self {
        let DestructRentalHistory {
            id,
            user_id,
            item_id,
            rented_at,
            returned_at,
        } = value.clone().into_destruct();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            item_id: item_id.into(),
            rented_at: rented_at.into(),
            returned_at: returned_at.map(OffsetDateTime::from),
        }
    }
}

pub(in crate::database) struct PgRentalHistoryInternal;

impl PgRentalHistoryInternal {
    async fn find_open_by_user_and_item(
        con: &mut PgConnection,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> error_stack::Result<Option<RentalHistory>, KernelError> {
        let row = sqlx::query_as::<_, RentalHistoryRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, item_id, rented_at, returned_at
            FROM rental_histories
            WHERE user_id = $1 AND item_id = $2 AND returned_at IS NULL
            "#,
        )
        .bind(user_id.as_ref())
        .bind(item_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(RentalHistory::from))
    }

    async fn find_open_by_user(
        con: &mut PgConnection,
        user_id: &UserId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError> {
        let rows = sqlx::query_as::<_, RentalHistoryRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, item_id, rented_at, returned_at
            FROM rental_histories
            WHERE user_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(user_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(RentalHistory::from).collect())
    }

    async fn find_by_item_id(
        con: &mut PgConnection,
        item_id: &ItemId,
    ) -> error_stack::Result<Vec<RentalHistory>, KernelError> {
        let rows = sqlx::query_as::<_, RentalHistoryRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, item_id, rented_at, returned_at
            FROM rental_histories
            WHERE item_id = $1
            ORDER BY rented_at
            "#,
        )
        .bind(item_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(RentalHistory::from).collect())
    }

    async fn create(
        con: &mut PgConnection,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError> {
        let row = RentalHistoryRow::from(history);
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO rental_histories (id, user_id, item_id, rented_at, returned_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(row.id)
        .bind(row.user_id)
        .bind(row.item_id)
        .bind(row.rented_at)
        .bind(row.returned_at)
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(
        con: &mut PgConnection,
        history: &RentalHistory,
    ) -> error_stack::Result<(), KernelError> {
        let row = RentalHistoryRow::from(history);
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE rental_histories
            SET returned_at = $2
            WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(row.returned_at)
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::Internal)
                .attach_printable(format!("rental {} is not stored", row.id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use time::macros::datetime;
    use time::Duration;
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::RentalHistoryQuery;
    use kernel::interface::update::{ItemModifier, RentalHistoryModifier};
    use kernel::prelude::entity::{
        IsRented, Item, ItemId, ItemName, RentalHistory, RentedAt, UserId,
    };
    use kernel::KernelError;

    use crate::database::postgres::{
        PostgresDatabase, PostgresItemRepository, PostgresRentalHistoryRepository,
    };

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn test() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;
        let item_id = ItemId::new(Uuid::new_v4().as_u128() as i64);
        let item = Item::new(item_id, ItemName::new("Stove"), IsRented::new(true));
        PostgresItemRepository.create(&mut con, &item).await?;

        let user_id = UserId::new(Uuid::new_v4().to_string());
        // Postgres keeps microseconds only.
        let rented_at = datetime!(2023-11-14 22:13:20 UTC);
        let history = RentalHistory::open(user_id.clone(), item_id, RentedAt::new(rented_at));
        PostgresRentalHistoryRepository
            .create(&mut con, &history)
            .await?;

        let found = PostgresRentalHistoryRepository
            .find_open_by_user_and_item(&mut con, &user_id, &item_id)
            .await?;
        assert_eq!(found, Some(history.clone()));

        let duplicate = RentalHistory::open(user_id.clone(), item_id, RentedAt::new(rented_at));
        let report = PostgresRentalHistoryRepository
            .create(&mut con, &duplicate)
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Conflict);
        con.roll_back().await?;

        let mut con = db.transact().await?;
        PostgresItemRepository.create(&mut con, &item).await?;
        PostgresRentalHistoryRepository
            .create(&mut con, &history)
            .await?;
        let returned = history.mark_returned(rented_at + Duration::days(2))?;
        PostgresRentalHistoryRepository
            .update(&mut con, &returned)
            .await?;

        let open = PostgresRentalHistoryRepository
            .find_open_by_user(&mut con, &user_id)
            .await?;
        assert!(open.is_empty());
        let all = PostgresRentalHistoryRepository
            .find_by_item_id(&mut con, &item_id)
            .await?;
        assert_eq!(all, vec![returned]);

        con.roll_back().await?;
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn update_of_missing_rental_fails() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        let mut con = db.transact().await?;
        let history = RentalHistory::open(
            UserId::new(Uuid::new_v4().to_string()),
            ItemId::new(Uuid::new_v4().as_u128() as i64),
            RentedAt::new(datetime!(2023-11-14 22:13:20 UTC)),
        );
        let report = PostgresRentalHistoryRepository
            .update(&mut con, &history)
            .await
            .unwrap_err();
        assert_eq!(report.current_context(), &KernelError::Internal);
        con.roll_back().await?;
        Ok(())
    }
}
