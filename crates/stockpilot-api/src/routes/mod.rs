//! API route modules.

pub mod account;
pub mod admin;
pub mod catalog;
pub mod functions;
pub mod generations;
pub mod health;
pub mod media;
pub mod tools;
pub mod uploads;
