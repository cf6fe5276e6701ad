//! In-process basket store, used by the integration tests.
//!
//! One global async mutex plays the role of the basket row lock: a
//! transaction holds it from `begin` to `commit`, staging every write on a
//! scratch copy that is swapped in atomically at commit. Dropping the
//! transaction without committing discards the scratch copy, so rollback
//! semantics match the Postgres adapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::basket::{Basket, BasketItem};
use crate::domain::product::{Color, Size};
use crate::error::{Error, Result};
use crate::store::{BasketStore, BasketTx};

#[derive(Clone, Debug, Default)]
struct State {
    baskets: HashMap<Uuid, Basket>,
    items: HashMap<Uuid, BasketItem>,
}

#[derive(Clone, Default)]
pub struct MemoryBasketStore {
    state: Arc<Mutex<State>>,
}

impl MemoryBasketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryBasketTx {
    guard: OwnedMutexGuard<State>,
    scratch: State,
}

#[async_trait]
impl BasketStore for MemoryBasketStore {
    type Tx = MemoryBasketTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let scratch = guard.clone();
        Ok(MemoryBasketTx { guard, scratch })
    }
}

#[async_trait]
impl BasketTx for MemoryBasketTx {
    async fn basket_for_user(&mut self, user_id: Uuid) -> Result<Option<Basket>> {
        let mut found: Vec<Basket> = self
            .scratch
            .baskets
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();

        if found.len() > 1 {
            return Err(Error::Inconsistent(format!(
                "user {user_id} resolves to {} baskets",
                found.len()
            )));
        }
        Ok(found.pop())
    }

    async fn get_or_create_basket(&mut self, user_id: Uuid) -> Result<Basket> {
        if let Some(existing) = self.basket_for_user(user_id).await? {
            return Ok(existing);
        }
        let basket = Basket::new(user_id);
        self.scratch.baskets.insert(basket.id, basket.clone());
        Ok(basket)
    }

    async fn items(&mut self, basket_id: Uuid) -> Result<Vec<BasketItem>> {
        Ok(self
            .scratch
            .items
            .values()
            .filter(|i| i.basket_id == basket_id)
            .cloned()
            .collect())
    }

    async fn find_item_by_variant(
        &mut self,
        basket_id: Uuid,
        product_id: Uuid,
        color: Color,
        size: Size,
    ) -> Result<Option<BasketItem>> {
        Ok(self
            .scratch
            .items
            .values()
            .find(|i| {
                i.basket_id == basket_id
                    && i.product_id == product_id
                    && i.color == color
                    && i.size == size
            })
            .cloned())
    }

    async fn find_item(&mut self, basket_id: Uuid, item_id: Uuid) -> Result<Option<BasketItem>> {
        Ok(self
            .scratch
            .items
            .get(&item_id)
            .filter(|i| i.basket_id == basket_id)
            .cloned())
    }

    async fn insert_item(&mut self, item: &BasketItem) -> Result<()> {
        self.scratch.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&mut self, item: &BasketItem) -> Result<()> {
        self.scratch.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_item(&mut self, item_id: Uuid) -> Result<()> {
        self.scratch.items.remove(&item_id);
        Ok(())
    }

    async fn save_basket(&mut self, basket: &Basket) -> Result<()> {
        self.scratch.baskets.insert(basket.id, basket.clone());
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.scratch;
        Ok(())
    }
}
