//! Read-only catalog capability consumed by the basket service.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::product::Product;
use crate::error::{Error, Result};

#[async_trait]
pub trait Catalog: Send + Sync + 'static {
    /// Product by id; `ProductNotFound` when absent.
    async fn product(&self, id: Uuid) -> Result<Product>;
}

/// Fixed in-memory catalog for tests and demos.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    products: HashMap<Uuid, Product>,
}

impl MemoryCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn product(&self, id: Uuid) -> Result<Product> {
        self.products.get(&id).cloned().ok_or(Error::ProductNotFound)
    }
}
