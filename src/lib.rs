//! Boutique
//!
//! Clothing storefront backend. The interesting part is the basket engine:
//! each user owns at most one basket whose cached `total_items` and
//! `total_price` must equal the sums over its line items after every
//! completed mutation. Add/merge, decrement-to-delete, and remove all run
//! inside a single store transaction holding the basket row, so concurrent
//! requests for one user cannot lose updates. The catalog side (products,
//! categories, brands) is plain CRUD feeding the basket's read-only
//! product lookups.

pub mod api;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;

pub use error::{Error, Result};
