//! Core business logic, independent of any UI surface.
//!
//! Database-backed operations take a `&DatabaseConnection` and an explicit clock value;
//! pure pieces (price resolution, the order builder, receipts, export) work on loaded
//! snapshots.

pub mod activity;
pub mod admin_settings;
pub mod catalog;
pub mod credentials;
pub mod edits;
pub mod export;
pub mod order;
pub mod pricing;
pub mod receipt;
pub mod session;
pub mod zone;
