//! Order records.
//!
//! An order's `total` is always derived from its items. It is computed on creation
//! and recomputed whenever an update replaces the items, so it can never go stale.

use crate::{
    core::entity_store::{EntityStore, Record, non_blank, require_amount, require_text},
    errors::{Error, Result},
    storage::{KeyValueStore, ORDERS_KEY},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Created, not yet handed over
    #[default]
    Pending,
    /// Delivered to the customer
    Fulfilled,
    /// Abandoned
    Cancelled,
}

impl OrderStatus {
    /// Lowercase name as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line on an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product name as sold
    pub name: String,
    /// Units sold, at least one
    pub quantity: u32,
    /// Unit price
    pub price: f64,
}

impl OrderItem {
    /// Creates an item line.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: u32, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    /// `quantity × price`
    #[must_use]
    pub fn line_total(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

/// Sum of all item line totals.
#[must_use]
pub fn items_total(items: &[OrderItem]) -> f64 {
    items.iter().map(OrderItem::line_total).sum()
}

fn validate_items(items: &[OrderItem]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::validation("An order needs at least one item"));
    }
    for item in items {
        require_text("Item name", &item.name)?;
        if item.quantity == 0 {
            return Err(Error::validation(format!(
                "Quantity for '{}' must be at least 1",
                item.name
            )));
        }
        require_amount(item.price)?;
    }
    Ok(())
}

/// A customer order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique, time-ordered identifier
    pub id: String,
    /// Customer display name
    #[serde(default)]
    pub customer_name: String,
    /// Customer phone, the key customers are tracked by
    #[serde(default)]
    pub customer_phone: String,
    /// Customer email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// Lines on the order
    pub items: Vec<OrderItem>,
    /// Sum of line totals
    pub total: f64,
    /// Current status
    #[serde(default)]
    pub status: OrderStatus,
    /// Business date of the order
    pub date: DateTime<Utc>,
    /// When the order was created
    pub created_at: DateTime<Utc>,
    /// When the order was last modified
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new order. New orders always start as pending.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Customer display name
    #[serde(default)]
    pub customer_name: String,
    /// Customer phone
    #[serde(default)]
    pub customer_phone: String,
    /// Customer email
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Order lines
    pub items: Vec<OrderItem>,
    /// Caller's idea of the total; must match the items when given
    #[serde(default)]
    pub total: Option<f64>,
    /// Business date; defaults to creation time
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Partial order update. Replacing `items` recomputes the total; the total itself
/// is not patchable.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderPatch {
    /// New customer name
    pub customer_name: Option<String>,
    /// New customer phone
    pub customer_phone: Option<String>,
    /// New customer email; an empty string clears it
    pub customer_email: Option<String>,
    /// Replacement item list
    pub items: Option<Vec<OrderItem>>,
    /// New status
    pub status: Option<OrderStatus>,
    /// New business date
    pub date: Option<DateTime<Utc>>,
}

fn totals_agree(supplied: f64, derived: f64) -> bool {
    (supplied - derived).abs() <= 1e-9 * derived.abs().max(1.0)
}

impl Record for Order {
    const COLLECTION_KEY: &'static str = ORDERS_KEY;
    const KIND: &'static str = "order";

    type Draft = OrderDraft;
    type Patch = OrderPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: OrderDraft, now: DateTime<Utc>) -> Result<Self> {
        validate_items(&draft.items)?;
        let total = items_total(&draft.items);

        if let Some(supplied) = draft.total {
            if !totals_agree(supplied, total) {
                return Err(Error::validation(format!(
                    "Order total {supplied} does not match item total {total}"
                )));
            }
        }

        Ok(Self {
            id,
            customer_name: draft.customer_name.trim().to_string(),
            customer_phone: draft.customer_phone.trim().to_string(),
            customer_email: non_blank(draft.customer_email),
            items: draft.items,
            total,
            status: OrderStatus::Pending,
            date: draft.date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: OrderPatch) -> Result<()> {
        if let Some(items) = patch.items {
            validate_items(&items)?;
            self.total = items_total(&items);
            self.items = items;
        }
        if let Some(name) = patch.customer_name {
            self.customer_name = name.trim().to_string();
        }
        if let Some(phone) = patch.customer_phone {
            self.customer_phone = phone.trim().to_string();
        }
        if let Some(email) = patch.customer_email {
            self.customer_email = non_blank(Some(email));
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Store of all orders.
pub type OrderStore<S> = EntityStore<Order, S>;

impl<S: KeyValueStore> EntityStore<Order, S> {
    /// Moves an order to `status`. Any status may follow any other.
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id, or [`Error::Persistence`] if the
    /// write fails.
    pub async fn set_status(&mut self, id: &str, status: OrderStatus) -> Result<Order> {
        self.update(
            id,
            OrderPatch {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}
