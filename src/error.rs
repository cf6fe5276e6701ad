//! Error taxonomy shared by the domain, store, and service layers.

use thiserror::Error;

use crate::domain::product::{Color, Size};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Product is not found with given id!")]
    ProductNotFound,

    #[error("User has no basket yet!")]
    BasketNotFound,

    #[error("Basket item is not found!")]
    BasketItemNotFound,

    #[error("Category is not found with given id!")]
    CategoryNotFound,

    #[error("Brand is not found with given id!")]
    BrandNotFound,

    #[error("Products not found with given parameters")]
    NoMatchingProducts,

    #[error("Color {0} is not offered for this product!")]
    InvalidColor(Color),

    #[error("Size {0} is not offered for this product!")]
    InvalidSize(Size),

    #[error("Quantity must be positive when adding a new item")]
    InvalidQuantity,

    #[error("Product already exists with slug '{0}'")]
    SlugTaken(String),

    #[error("basket state is inconsistent: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
