//! Core domain models shared across all Stockpilot services.
//!
//! These are the "truth" types: what the database stores and the API serializes.

pub mod content;
pub mod credit_pack;
pub mod generation;
pub mod plan;
pub mod subscription;

/// Re-export all model types for convenience.
pub use content::*;
pub use credit_pack::*;
pub use generation::*;
pub use plan::*;
pub use subscription::*;
