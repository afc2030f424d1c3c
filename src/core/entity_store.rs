//! Generic snapshot-persisted collection.
//!
//! An [`EntityStore`] owns the in-memory copy of one collection (products, orders or
//! customers) and writes the *entire* collection back to its storage key after every
//! mutation. Reads are served from memory only; storage is consulted once at
//! [`EntityStore::load`].
//!
//! Write failures are reported to the caller but do not roll back the in-memory
//! change: the store is last-write-wins and best-effort, not transactional.

use crate::{
    core::clock::Clock,
    errors::{Error, Result},
    storage::KeyValueStore,
};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// A record kept in an [`EntityStore`].
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Storage key holding the collection snapshot
    const COLLECTION_KEY: &'static str;
    /// Human-readable record kind used in errors and logs
    const KIND: &'static str;

    /// Input accepted by [`EntityStore::create`]
    type Draft;
    /// Partial update accepted by [`EntityStore::update`]
    type Patch: DeserializeOwned;

    /// The record's identity
    fn id(&self) -> &str;

    /// Builds a new record from validated draft fields.
    ///
    /// # Errors
    /// Returns a validation error if the draft is malformed.
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self>;

    /// Merges `patch` onto the record. Fields absent from the patch are untouched.
    ///
    /// # Errors
    /// Returns a validation error if a patched value is malformed; the record may
    /// then be partially modified, so callers apply patches to a copy.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<()>;

    /// Refreshes the modification stamp, for records that carry one.
    fn touch(&mut self, now: DateTime<Utc>);
}

/// Generates a new time-ordered unique record id.
#[must_use]
pub fn new_record_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Rejects blank text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Rejects negative, NaN and infinite amounts.
pub(crate) fn require_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Trims optional text, mapping blank values to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Keyed collection with whole-snapshot persistence.
pub struct EntityStore<T, S> {
    storage: S,
    clock: Arc<dyn Clock>,
    records: Vec<T>,
}

impl<T: Record, S: KeyValueStore> EntityStore<T, S> {
    /// Creates a store and loads its persisted snapshot.
    ///
    /// # Errors
    /// As [`EntityStore::load`].
    pub async fn open(storage: S, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut store = Self {
            storage,
            clock,
            records: Vec::new(),
        };
        store.load().await?;
        Ok(store)
    }

    /// Replaces the in-memory collection with the persisted snapshot.
    ///
    /// A missing key yields an empty collection. A payload that fails to parse is
    /// logged and also treated as empty; the corrupt payload stays in storage until
    /// the next successful write replaces it.
    ///
    /// # Errors
    /// Returns [`Error::Persistence`] if the storage read itself fails.
    #[instrument(skip(self), fields(collection = T::COLLECTION_KEY))]
    pub async fn load(&mut self) -> Result<&[T]> {
        let payload = self.storage.read(T::COLLECTION_KEY).await?;

        self.records = match payload {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(
                    "Discarding unreadable {} snapshot: {}",
                    T::COLLECTION_KEY,
                    e
                );
                Vec::new()
            }),
        };

        debug!("Loaded {} {} record(s)", self.records.len(), T::KIND);
        Ok(&self.records)
    }

    /// Current in-memory snapshot in insertion order.
    #[must_use]
    pub fn all(&self) -> &[T] {
        &self.records
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Number of records in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current time according to the injected clock.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a record, appends it and persists the collection.
    ///
    /// # Errors
    /// - Validation errors leave the collection untouched.
    /// - [`Error::Persistence`] if the write fails; the new record remains in memory.
    #[instrument(skip(self, draft), fields(collection = T::COLLECTION_KEY))]
    pub async fn create(&mut self, draft: T::Draft) -> Result<T> {
        let record = self.insert(draft)?;
        self.persist().await?;
        Ok(record)
    }

    /// Validates `draft` and appends the new record to memory without writing.
    ///
    /// Callers that coordinate several stores use this with
    /// [`EntityStore::persist`] to act on a record before its write is attempted.
    ///
    /// # Errors
    /// Validation errors leave the collection untouched.
    pub(crate) fn insert(&mut self, draft: T::Draft) -> Result<T> {
        let record = T::from_draft(new_record_id(), draft, self.clock.now())?;
        self.records.push(record.clone());
        info!("Created {} {}", T::KIND, record.id());
        Ok(record)
    }

    /// Merges `patch` onto the record with `id`, refreshes its stamp and persists.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if no record has `id`.
    /// - Validation errors leave the record untouched.
    /// - [`Error::Persistence`] if the write fails; the update remains in memory.
    #[instrument(skip(self, patch), fields(collection = T::COLLECTION_KEY))]
    pub async fn update(&mut self, id: &str, patch: T::Patch) -> Result<T> {
        let now = self.clock.now();
        let slot = self
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;

        let mut updated = slot.clone();
        updated.apply_patch(patch)?;
        updated.touch(now);
        *slot = updated.clone();
        info!("Updated {} {}", T::KIND, id);

        self.persist().await?;
        Ok(updated)
    }

    /// Like [`EntityStore::update`], but takes an untyped field map.
    ///
    /// Field names are checked against the record's patchable fields and values
    /// against their types before anything is merged.
    ///
    /// # Errors
    /// [`Error::Validation`] for unknown fields or wrongly typed values, otherwise
    /// as [`EntityStore::update`].
    pub async fn update_fields(&mut self, id: &str, fields: serde_json::Value) -> Result<T> {
        let patch: T::Patch = serde_json::from_value(fields)
            .map_err(|e| Error::validation(format!("Invalid {} fields: {e}", T::KIND)))?;
        self.update(id, patch).await
    }

    /// Removes the record with `id` and persists the reduced collection.
    ///
    /// Deleting an id that is not present succeeds without writing.
    ///
    /// # Errors
    /// [`Error::Persistence`] if the write fails; the removal remains in memory.
    #[instrument(skip(self), fields(collection = T::COLLECTION_KEY))]
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);

        if self.records.len() == before {
            debug!("No {} {} to delete", T::KIND, id);
            return Ok(());
        }

        info!("Deleted {} {}", T::KIND, id);
        self.persist().await
    }

    /// Writes the whole in-memory collection to its storage key.
    ///
    /// # Errors
    /// [`Error::Persistence`] if serialization or the write fails.
    pub(crate) async fn persist(&self) -> Result<()> {
        let payload = serde_json::to_string(&self.records).map_err(|e| {
            Error::persistence(format!("Failed to serialize {}: {e}", T::COLLECTION_KEY))
        })?;

        self.storage
            .write(T::COLLECTION_KEY, &payload)
            .await
            .inspect_err(|e| error!("Failed to persist {}: {}", T::COLLECTION_KEY, e))
    }
}
