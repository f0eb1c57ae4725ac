//! Repository layer: typed database access functions.
//!
//! Each module maps to a table (or a table with its join rows) and exposes
//! async functions over `&PgPool`.

pub mod content;
pub mod credit_packs;
pub mod generations;
pub mod plans;
pub mod roles;
pub mod subscriptions;
