//! Basket aggregate: one basket per user plus its owned line items.
//!
//! The basket caches `total_items` and `total_price`. Both are maintained
//! incrementally by the mutation ops: after every completed operation they
//! equal the sums over the current line items. The delta form relies on the
//! previous totals being correct, so every adjustment must go through the
//! methods here and be persisted together with the item write.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::{Color, Size};

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Basket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_items: i32,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct BasketItem {
    pub id: Uuid,
    pub basket_id: Uuid,
    pub product_id: Uuid,
    pub color: Color,
    pub size: Size,
    pub quantity: i32,
    /// Denormalized line total: `unit_price × quantity` as of the last write.
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Basket {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            total_items: 0,
            total_price: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adjust the cached totals for a signed quantity change of `delta`
    /// units at `unit_price` each.
    pub fn apply_delta(&mut self, unit_price: Decimal, delta: i32) {
        self.total_items += delta;
        self.total_price += unit_price * Decimal::from(delta);
        self.touch();
    }

    /// Back the whole line out of the cached totals before deleting it.
    pub fn apply_removal(&mut self, item: &BasketItem) {
        self.total_items -= item.quantity;
        self.total_price -= item.price;
        self.touch();
    }

    /// Whether the cached totals agree with the item sums.
    pub fn totals_match(&self, items: &[BasketItem]) -> bool {
        let quantity: i32 = items.iter().map(|i| i.quantity).sum();
        let price: Decimal = items.iter().map(|i| i.price).sum();
        self.total_items == quantity && self.total_price == price
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl BasketItem {
    /// New line for a first add of a `(product, color, size)` combination.
    /// Requires `quantity > 0`; callers enforce that before constructing.
    pub fn new(
        basket_id: Uuid,
        product_id: Uuid,
        color: Color,
        size: Size,
        quantity: i32,
        unit_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            basket_id,
            product_id,
            color,
            size,
            quantity,
            price: unit_price * Decimal::from(quantity),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the merged quantity and recompute the line total from scratch.
    pub fn reprice(&mut self, quantity: i32, unit_price: Decimal) {
        self.quantity = quantity;
        self.price = unit_price * Decimal::from(quantity);
        self.updated_at = Utc::now();
    }
}
