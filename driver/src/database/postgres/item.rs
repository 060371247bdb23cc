use error_stack::Report;
use sqlx::PgConnection;

use kernel::interface::query::ItemQuery;
use kernel::interface::update::ItemModifier;
use kernel::prelude::entity::{IsRented, Item, ItemId, ItemName};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresItemRepository;

#[async_trait::async_trait]
impl ItemQuery for PostgresItemRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        PgItemInternal::find_by_id(con, id).await
    }

    async fn find_for_update(
        &self,
        con: &mut PostgresTransaction,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        PgItemInternal::find_for_update(con, id).await
    }
}

#[async_trait::async_trait]
impl ItemModifier for PostgresItemRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        item: &Item,
    ) -> error_stack::Result<(), KernelError> {
        PgItemInternal::create(con, item).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        item: &Item,
    ) -> error_stack::Result<(), KernelError> {
        PgItemInternal::update(con, item).await
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    is_rented: bool,
}

impl From<ItemRow> for Item {
    fn from(value: ItemRow) -> Self {
        Item::new(
            ItemId::new(value.id),
            ItemName::new(value.name),
            IsRented::new(value.is_rented),
        )
    }
}

pub(in crate::database) struct PgItemInternal;

impl PgItemInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        let row = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            SELECT id, name, is_rented
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Item::from))
    }

    async fn find_for_update(
        con: &mut PgConnection,
        id: &ItemId,
    ) -> error_stack::Result<Option<Item>, KernelError> {
        let row = sqlx::query_as::<_, ItemRow>(
            // language=postgresql
            r#"
            SELECT id, name, is_rented
            FROM items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Item::from))
    }

    async fn create(con: &mut PgConnection, item: &Item) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO items (id, name, is_rented)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(item.id().as_ref())
        .bind(item.name().as_ref())
        .bind(item.is_rented().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(con: &mut PgConnection, item: &Item) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $2, is_rented = $3
            WHERE id = $1
            "#,
        )
        .bind(item.id().as_ref())
        .bind(item.name().as_ref())
        .bind(item.is_rented().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::Internal)
                .attach_printable(format!("item {} is not stored", item.id().as_ref())));
        }
        tracing::debug!(item = *item.id().as_ref(), "item updated");
        Ok(())
    }
}
