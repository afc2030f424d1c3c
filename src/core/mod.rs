//! Core business logic - framework-agnostic stores, lifecycle rules and queries.

/// Order placement across the order and customer stores
pub mod checkout;
/// Injectable time source
pub mod clock;
/// Customer records keyed by phone
pub mod customer;
/// Generic snapshot-persisted record store
pub mod entity_store;
/// Order records and status changes
pub mod order;
/// Product records and stock adjustments
pub mod product;
/// Business profile and session
pub mod profile;
/// Plain-text receipts
pub mod receipt;
/// Aggregation queries and the dashboard summary
pub mod report;
/// Trial, active and expired subscription states
pub mod subscription;
