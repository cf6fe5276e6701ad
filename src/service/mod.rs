//! Application services consumed by the HTTP layer.

pub mod basket;
pub mod product;

pub use basket::BasketService;
pub use product::ProductService;
