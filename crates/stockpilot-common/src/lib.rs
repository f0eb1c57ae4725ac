//! # stockpilot-common
//!
//! Shared types, configuration, error handling, and utilities used across all Stockpilot crates.
//! This is the foundation layer: no I/O, just primitives and contracts.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod presence;
pub mod text;
pub mod validation;
