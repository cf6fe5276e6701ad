//! Basket operations: read, add/merge, remove.
//!
//! Every mutation resolves the user's basket, reads and writes line items,
//! and adjusts the cached totals inside a single store transaction, with
//! the basket row held for the whole read-compute-write sequence. All
//! validation happens before any write, so a failed operation commits
//! nothing, including the lazily-created basket row.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::domain::basket::BasketItem;
use crate::domain::product::{Color, Product, Size};
use crate::error::{Error, Result};
use crate::store::{BasketStore, BasketTx};

#[derive(Clone)]
pub struct BasketService<S, C> {
    store: S,
    catalog: C,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct AddItemRequest {
    pub color: Color,
    pub size: Size,
    /// Signed quantity adjustment: positive adds, negative decrements, a
    /// drop to zero or below deletes the line.
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AddItemOutcome {
    /// The line item as created or merged.
    Upserted(BasketItem),
    /// The adjustment drove the quantity to zero or below; the line was
    /// deleted rather than persisted non-positive.
    Removed { item_id: Uuid },
}

/// Basket expanded for the read contract: each line embeds its product
/// narrowed to the selected color and size.
#[derive(Debug, Serialize)]
pub struct BasketView {
    pub id: Uuid,
    pub total_items: i32,
    pub total_price: Decimal,
    pub items: Vec<BasketItemView>,
}

#[derive(Debug, Serialize)]
pub struct BasketItemView {
    pub id: Uuid,
    pub color: Color,
    pub size: Size,
    pub quantity: i32,
    pub price: Decimal,
    pub product: Product,
}

impl<S: BasketStore, C: Catalog> BasketService<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// The user's basket with items expanded, or `BasketNotFound` when the
    /// user has never added anything.
    pub async fn get_basket(&self, user_id: Uuid) -> Result<BasketView> {
        let mut tx = self.store.begin().await?;
        let basket = tx
            .basket_for_user(user_id)
            .await?
            .ok_or(Error::BasketNotFound)?;
        let items = tx.items(basket.id).await?;
        tx.commit().await?;

        let mut views = Vec::with_capacity(items.len());
        for item in items {
            let product = self.catalog.product(item.product_id).await?;
            views.push(BasketItemView {
                id: item.id,
                color: item.color,
                size: item.size,
                quantity: item.quantity,
                price: item.price,
                product: product.narrowed_to(item.color, item.size),
            });
        }

        Ok(BasketView {
            id: basket.id,
            total_items: basket.total_items,
            total_price: basket.total_price,
            items: views,
        })
    }

    /// Add `req.quantity` units of a product variant to the user's basket,
    /// merging into an existing line when one matches
    /// `(product, color, size)`.
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        req: AddItemRequest,
    ) -> Result<AddItemOutcome> {
        let product = self.catalog.product(product_id).await?;

        let mut tx = self.store.begin().await?;
        let mut basket = tx.get_or_create_basket(user_id).await?;
        let existing = tx
            .find_item_by_variant(basket.id, product_id, req.color, req.size)
            .await?;

        match existing {
            Some(mut item) => {
                let new_quantity = item.quantity + req.quantity;
                if new_quantity <= 0 {
                    basket.apply_removal(&item);
                    tx.delete_item(item.id).await?;
                    tx.save_basket(&basket).await?;
                    tx.commit().await?;
                    tracing::info!(%user_id, item_id = %item.id, "basket line removed by merge");
                    Ok(AddItemOutcome::Removed { item_id: item.id })
                } else {
                    item.reprice(new_quantity, product.price);
                    basket.apply_delta(product.price, req.quantity);
                    tx.update_item(&item).await?;
                    tx.save_basket(&basket).await?;
                    tx.commit().await?;
                    tracing::info!(%user_id, item_id = %item.id, quantity = new_quantity, "basket line merged");
                    Ok(AddItemOutcome::Upserted(item))
                }
            }
            None => {
                if !product.has_color(req.color) {
                    return Err(Error::InvalidColor(req.color));
                }
                if !product.has_size(req.size) {
                    return Err(Error::InvalidSize(req.size));
                }
                if req.quantity <= 0 {
                    return Err(Error::InvalidQuantity);
                }

                let item = BasketItem::new(
                    basket.id,
                    product_id,
                    req.color,
                    req.size,
                    req.quantity,
                    product.price,
                );
                basket.apply_delta(product.price, req.quantity);
                tx.insert_item(&item).await?;
                tx.save_basket(&basket).await?;
                tx.commit().await?;
                tracing::info!(%user_id, item_id = %item.id, quantity = item.quantity, "basket line created");
                Ok(AddItemOutcome::Upserted(item))
            }
        }
    }

    /// Delete a line item outright and back it out of the cached totals.
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let mut basket = tx
            .basket_for_user(user_id)
            .await?
            .ok_or(Error::BasketNotFound)?;
        let item = tx
            .find_item(basket.id, item_id)
            .await?
            .ok_or(Error::BasketItemNotFound)?;

        basket.apply_removal(&item);
        tx.delete_item(item.id).await?;
        tx.save_basket(&basket).await?;
        tx.commit().await?;
        tracing::info!(%user_id, %item_id, "basket line removed");
        Ok(())
    }
}
