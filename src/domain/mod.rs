//! Domain model: products with closed variant sets, and the basket
//! aggregate whose cached totals must always match its line items.

pub mod basket;
pub mod product;
