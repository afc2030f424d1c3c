//! `SQLite`-backed key-value store.

use crate::entities::{KvEntry, kv_entry};
use crate::errors::Result;
use crate::storage::KeyValueStore;
use sea_orm::{Set, prelude::*};
use tracing::{debug, instrument};

/// Key-value store persisting into the `kv_store` table.
///
/// A namespace keeps logically separate slots (such as the credential slot) apart
/// while sharing one database file.
#[derive(Clone, Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
    namespace: Option<String>,
}

impl DatabaseStore {
    /// Creates a store writing keys as-is.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            namespace: None,
        }
    }

    /// Creates a store whose keys are prefixed with `namespace/`.
    #[must_use]
    pub fn namespaced(db: DatabaseConnection, namespace: &str) -> Self {
        Self {
            db,
            namespace: Some(namespace.to_string()),
        }
    }

    fn scoped(&self, key: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{key}"),
            None => key.to_string(),
        }
    }
}

impl KeyValueStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let entry = KvEntry::find_by_id(self.scoped(key)).one(&self.db).await?;
        debug!("Read key '{}': present = {}", key, entry.is_some());
        Ok(entry.map(|e| e.value))
    }

    #[instrument(skip(self, value))]
    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let scoped = self.scoped(key);
        let now = chrono::Utc::now().naive_utc();

        let existing = KvEntry::find_by_id(scoped.clone()).one(&self.db).await?;
        if let Some(entry) = existing {
            let mut active_model: kv_entry::ActiveModel = entry.into();
            active_model.value = Set(value.to_string());
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_entry = kv_entry::ActiveModel {
                key: Set(scoped),
                value: Set(value.to_string()),
                updated_at: Set(now),
            };
            new_entry.insert(&self.db).await?;
        }

        debug!("Wrote key '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let result = KvEntry::delete_by_id(self.scoped(key)).exec(&self.db).await?;
        debug!("Removed key '{}' ({} rows)", key, result.rows_affected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_read_missing_key() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);
        assert_eq!(store.read("products").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_then_overwrite() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);

        store.write("products", "[]").await?;
        assert_eq!(store.read("products").await?.as_deref(), Some("[]"));

        store.write("products", r#"[{"id":"1"}]"#).await?;
        assert_eq!(
            store.read("products").await?.as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        let rows = KvEntry::find().all(&store.db).await?;
        assert_eq!(rows.len(), 1, "overwrite must not add a second row");
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() -> Result<()> {
        let store = DatabaseStore::new(setup_test_db().await?);
        store.write("userData", "{}").await?;

        store.remove("userData").await?;
        store.remove("userData").await?;
        assert_eq!(store.read("userData").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() -> Result<()> {
        let db = setup_test_db().await?;
        let plain = DatabaseStore::new(db.clone());
        let vault = DatabaseStore::namespaced(db, "vault");

        vault.write("userToken", "abc").await?;
        assert_eq!(plain.read("userToken").await?, None);
        assert_eq!(plain.read("vault/userToken").await?.as_deref(), Some("abc"));
        assert_eq!(vault.read("userToken").await?.as_deref(), Some("abc"));
        Ok(())
    }
}
