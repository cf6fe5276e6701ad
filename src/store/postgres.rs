//! Postgres adapter for the basket store.
//!
//! Locking discipline: `basket_for_user` takes `FOR UPDATE` on the basket
//! row; `get_or_create_basket` relies on `ON CONFLICT (user_id) DO UPDATE`,
//! which both returns the surviving row and leaves it write-locked. Either
//! way the lock is held until commit, closing the read-compute-write race
//! on the cached totals.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::basket::{Basket, BasketItem};
use crate::domain::product::{Color, Size};
use crate::error::{Error, Result};
use crate::store::{BasketStore, BasketTx};

#[derive(Clone)]
pub struct PgBasketStore {
    pool: PgPool,
}

impl PgBasketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgBasketTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BasketStore for PgBasketStore {
    type Tx = PgBasketTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PgBasketTx { tx })
    }
}

#[async_trait]
impl BasketTx for PgBasketTx {
    async fn basket_for_user(&mut self, user_id: Uuid) -> Result<Option<Basket>> {
        let mut rows = sqlx::query_as::<_, Basket>(
            "SELECT * FROM baskets WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        if rows.len() > 1 {
            return Err(Error::Inconsistent(format!(
                "user {user_id} resolves to {} baskets",
                rows.len()
            )));
        }
        Ok(rows.pop())
    }

    async fn get_or_create_basket(&mut self, user_id: Uuid) -> Result<Basket> {
        let basket = sqlx::query_as::<_, Basket>(
            "INSERT INTO baskets (id, user_id, total_items, total_price, created_at, updated_at) \
             VALUES ($1, $2, 0, 0, NOW(), NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(basket)
    }

    async fn items(&mut self, basket_id: Uuid) -> Result<Vec<BasketItem>> {
        let items = sqlx::query_as::<_, BasketItem>(
            "SELECT * FROM basket_items WHERE basket_id = $1",
        )
        .bind(basket_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(items)
    }

    async fn find_item_by_variant(
        &mut self,
        basket_id: Uuid,
        product_id: Uuid,
        color: Color,
        size: Size,
    ) -> Result<Option<BasketItem>> {
        let item = sqlx::query_as::<_, BasketItem>(
            "SELECT * FROM basket_items \
             WHERE basket_id = $1 AND product_id = $2 AND color = $3 AND size = $4",
        )
        .bind(basket_id)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn find_item(&mut self, basket_id: Uuid, item_id: Uuid) -> Result<Option<BasketItem>> {
        let item = sqlx::query_as::<_, BasketItem>(
            "SELECT * FROM basket_items WHERE basket_id = $1 AND id = $2",
        )
        .bind(basket_id)
        .bind(item_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn insert_item(&mut self, item: &BasketItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO basket_items \
             (id, basket_id, product_id, color, size, quantity, price, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(item.id)
        .bind(item.basket_id)
        .bind(item.product_id)
        .bind(item.color)
        .bind(item.size)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_item(&mut self, item: &BasketItem) -> Result<()> {
        sqlx::query(
            "UPDATE basket_items SET quantity = $2, price = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_item(&mut self, item_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM basket_items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn save_basket(&mut self, basket: &Basket) -> Result<()> {
        sqlx::query(
            "UPDATE baskets SET total_items = $2, total_price = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(basket.id)
        .bind(basket.total_items)
        .bind(basket.total_price)
        .bind(basket.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
