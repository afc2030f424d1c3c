//! Customer records, keyed by phone number.
//!
//! Customers are never created directly; they are maintained as a side effect of
//! order placement through [`EntityStore::upsert_by_phone`].

use crate::{
    core::entity_store::{EntityStore, Record, non_blank, require_text},
    errors::Result,
    storage::{CUSTOMERS_KEY, KeyValueStore},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A customer known from past orders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Unique, time-ordered identifier
    pub id: String,
    /// Most recent name given for this phone
    pub name: String,
    /// Phone number, unique across customers
    pub phone: String,
    /// Email, if one was ever given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// When the customer first ordered
    pub created_at: DateTime<Utc>,
    /// When the customer last ordered
    pub last_order_date: DateTime<Utc>,
}

/// Contact details taken from an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CustomerContact {
    /// Customer name
    pub name: String,
    /// Customer phone
    pub phone: String,
    /// Customer email
    #[serde(default)]
    pub email: Option<String>,
}

/// Partial customer update. The phone is the identity key and cannot be patched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerPatch {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New last order date
    pub last_order_date: Option<DateTime<Utc>>,
}

impl Record for Customer {
    const COLLECTION_KEY: &'static str = CUSTOMERS_KEY;
    const KIND: &'static str = "customer";

    type Draft = CustomerContact;
    type Patch = CustomerPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: CustomerContact, now: DateTime<Utc>) -> Result<Self> {
        require_text("Customer name", &draft.name)?;
        require_text("Customer phone", &draft.phone)?;

        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            email: non_blank(draft.email),
            created_at: now,
            last_order_date: now,
        })
    }

    fn apply_patch(&mut self, patch: CustomerPatch) -> Result<()> {
        if let Some(name) = patch.name {
            require_text("Customer name", &name)?;
            self.name = name.trim().to_string();
        }
        if let Some(email) = non_blank(patch.email) {
            self.email = Some(email);
        }
        if let Some(date) = patch.last_order_date {
            self.last_order_date = date;
        }
        Ok(())
    }

    // Customers carry no modification stamp; `last_order_date` is set explicitly.
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

/// Store of all customers.
pub type CustomerStore<S> = EntityStore<Customer, S>;

impl<S: KeyValueStore> EntityStore<Customer, S> {
    /// Finds the customer with `phone`.
    #[must_use]
    pub fn find_by_phone(&self, phone: &str) -> Option<&Customer> {
        let phone = phone.trim();
        self.all().iter().find(|c| c.phone == phone)
    }

    /// Records an order from `contact`.
    ///
    /// A known phone gets its name replaced, its email replaced when one is given,
    /// and `last_order_date` moved to now. An unknown phone becomes a new customer
    /// whose `created_at` and `last_order_date` are both now.
    ///
    /// # Errors
    /// - [`Error::Validation`] if the name or phone is blank.
    /// - [`Error::Persistence`] if the write fails; the change stays in memory.
    ///
    /// [`Error::Validation`]: crate::errors::Error::Validation
    /// [`Error::Persistence`]: crate::errors::Error::Persistence
    pub async fn upsert_by_phone(&mut self, contact: CustomerContact) -> Result<Customer> {
        let existing = self.find_by_phone(&contact.phone).map(|c| c.id.clone());

        match existing {
            Some(id) => {
                debug!("Refreshing customer {} from new order", id);
                let patch = CustomerPatch {
                    name: Some(contact.name),
                    email: contact.email,
                    last_order_date: Some(self.now()),
                };
                self.update(&id, patch).await
            }
            None => self.create(contact).await,
        }
    }
}
