//! Key-value persistence boundary.
//!
//! Stores never talk to a database directly; they read and write whole JSON
//! snapshots through [`KeyValueStore`]. The `SQLite` backend is used by the binary,
//! the in-memory backend by tests and embedders that bring their own persistence.

pub mod database;
pub mod memory;

use crate::errors::Result;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

/// Key holding the JSON array of products
pub const PRODUCTS_KEY: &str = "products";
/// Key holding the JSON array of orders
pub const ORDERS_KEY: &str = "orders";
/// Key holding the JSON array of customers
pub const CUSTOMERS_KEY: &str = "customers";
/// Key holding the single subscription object
pub const SUBSCRIPTION_KEY: &str = "subscriptionData";
/// Key holding the business profile object
pub const PROFILE_KEY: &str = "userData";
/// Key in the credential store holding the session token
pub const SESSION_TOKEN_KEY: &str = "userToken";

/// Snapshot storage addressed by string keys.
///
/// Implementations are cheap to clone and clones share the same underlying data.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore: Clone {
    /// Returns the stored value, or `None` if the key was never written.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`; removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}
