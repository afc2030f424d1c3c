//! Entity module - `SeaORM` entity definitions backing the key-value store.

pub mod kv_entry;

pub use kv_entry::{Column as KvEntryColumn, Entity as KvEntry, Model as KvEntryModel};
