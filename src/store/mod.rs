//! Storage seam for the basket aggregate.
//!
//! Every mutating basket operation runs inside one [`BasketTx`]: begin,
//! read (with the basket row locked for the caller), compute, write, commit.
//! Dropping a transaction without committing discards all staged writes, so
//! a validation failure mid-operation leaves nothing behind.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::basket::{Basket, BasketItem};
use crate::domain::product::{Color, Size};
use crate::error::Result;

pub use memory::MemoryBasketStore;
pub use postgres::PgBasketStore;

#[async_trait]
pub trait BasketStore: Send + Sync + 'static {
    type Tx: BasketTx;

    async fn begin(&self) -> Result<Self::Tx>;
}

#[async_trait]
pub trait BasketTx: Send {
    /// The user's basket, write-locked for the rest of this transaction.
    /// More than one row for a user is an internal-consistency fault.
    async fn basket_for_user(&mut self, user_id: Uuid) -> Result<Option<Basket>>;

    /// Atomic get-or-create keyed on the `user_id` uniqueness constraint;
    /// concurrent first-adds for one user observe the same row. The row is
    /// write-locked on return.
    async fn get_or_create_basket(&mut self, user_id: Uuid) -> Result<Basket>;

    async fn items(&mut self, basket_id: Uuid) -> Result<Vec<BasketItem>>;

    /// Line item lookup by its merge key.
    async fn find_item_by_variant(
        &mut self,
        basket_id: Uuid,
        product_id: Uuid,
        color: Color,
        size: Size,
    ) -> Result<Option<BasketItem>>;

    /// Line item by id, scoped to the owning basket.
    async fn find_item(&mut self, basket_id: Uuid, item_id: Uuid) -> Result<Option<BasketItem>>;

    async fn insert_item(&mut self, item: &BasketItem) -> Result<()>;

    async fn update_item(&mut self, item: &BasketItem) -> Result<()>;

    async fn delete_item(&mut self, item_id: Uuid) -> Result<()>;

    /// Persist the basket's cached totals.
    async fn save_basket(&mut self, basket: &Basket) -> Result<()>;

    async fn commit(self) -> Result<()>;
}
