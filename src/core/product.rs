//! Product records and inventory-specific store operations.
//!
//! Products are the inventory: a name, unit price, on-hand stock and the threshold
//! below which the product counts as low on stock.

use crate::{
    core::entity_store::{EntityStore, Record, non_blank, require_amount, require_text},
    errors::{Error, Result},
    storage::{KeyValueStore, PRODUCTS_KEY},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

/// Threshold used when a product has no usable `lowStockAlert`.
pub const DEFAULT_LOW_STOCK_ALERT: u32 = 10;

const fn default_low_stock_alert() -> u32 {
    DEFAULT_LOW_STOCK_ALERT
}

/// Reads a threshold from a number or numeric string; anything else is `None`.
fn parse_alert(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_low_stock_alert<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_alert(&value).unwrap_or(DEFAULT_LOW_STOCK_ALERT))
}

fn lenient_optional_alert<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_alert(&value))
}

/// An inventory item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique, time-ordered identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Units on hand
    pub stock: u32,
    /// Free-form grouping (e.g. "Beverages")
    #[serde(default)]
    pub category: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Stock level at or below which the product is low on stock
    #[serde(
        default = "default_low_stock_alert",
        deserialize_with = "lenient_low_stock_alert"
    )]
    pub low_stock_alert: u32,
    /// Optional barcode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    /// When the product was created
    pub created_at: DateTime<Utc>,
    /// When the product was last modified
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether stock is at or below the alert threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_alert
    }

    /// Whether no units are left.
    #[must_use]
    pub const fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// Price times stock on hand.
    #[must_use]
    pub fn stock_value(&self) -> f64 {
        self.price * f64::from(self.stock)
    }
}

/// Fields for a new product.
///
/// A non-numeric `lowStockAlert` in JSON input is treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// Display name (required)
    pub name: String,
    /// Unit price (non-negative)
    pub price: f64,
    /// Initial stock
    #[serde(default)]
    pub stock: u32,
    /// Category
    #[serde(default)]
    pub category: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Alert threshold; defaults to [`DEFAULT_LOW_STOCK_ALERT`]
    #[serde(default, deserialize_with = "lenient_optional_alert")]
    pub low_stock_alert: Option<u32>,
    /// Barcode; blank means none
    #[serde(default)]
    pub barcode: Option<String>,
}

/// Partial product update. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    /// New name
    pub name: Option<String>,
    /// New price
    pub price: Option<f64>,
    /// New stock level
    pub stock: Option<u32>,
    /// New category
    pub category: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New alert threshold
    pub low_stock_alert: Option<u32>,
    /// New barcode; an empty string clears it
    pub barcode: Option<String>,
}

impl Record for Product {
    const COLLECTION_KEY: &'static str = PRODUCTS_KEY;
    const KIND: &'static str = "product";

    type Draft = ProductDraft;
    type Patch = ProductPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: ProductDraft, now: DateTime<Utc>) -> Result<Self> {
        require_text("Product name", &draft.name)?;
        require_amount(draft.price)?;

        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            price: draft.price,
            stock: draft.stock,
            category: draft.category.trim().to_string(),
            description: draft.description,
            low_stock_alert: draft.low_stock_alert.unwrap_or(DEFAULT_LOW_STOCK_ALERT),
            barcode: non_blank(draft.barcode),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ProductPatch) -> Result<()> {
        if let Some(name) = patch.name {
            require_text("Product name", &name)?;
            self.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            require_amount(price)?;
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(category) = patch.category {
            self.category = category.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(alert) = patch.low_stock_alert {
            self.low_stock_alert = alert;
        }
        if let Some(barcode) = patch.barcode {
            self.barcode = non_blank(Some(barcode));
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Store of all products.
pub type ProductStore<S> = EntityStore<Product, S>;

impl<S: KeyValueStore> EntityStore<Product, S> {
    /// Sets the on-hand stock of a product and refreshes its `updated_at`.
    ///
    /// # Errors
    /// [`Error::NotFound`] for an unknown id, or [`Error::Persistence`] if the
    /// write fails, in which case the new level is still kept in memory.
    pub async fn set_stock(&mut self, id: &str, stock: u32) -> Result<Product> {
        self.update(
            id,
            ProductPatch {
                stock: Some(stock),
                ..Default::default()
            },
        )
        .await
    }

    /// Adds `delta` (which may be negative) to a product's stock.
    ///
    /// # Errors
    /// [`Error::Validation`] if the result would be negative or overflow, and
    /// [`Error::NotFound`] for an unknown id.
    pub async fn adjust_stock(&mut self, id: &str, delta: i64) -> Result<Product> {
        let current = self.get(id).ok_or_else(|| Error::NotFound {
            kind: Product::KIND,
            id: id.to_string(),
        })?;

        let target = i64::from(current.stock) + delta;
        if target < 0 {
            return Err(Error::validation(format!(
                "Stock for '{}' cannot go below zero ({} {delta:+})",
                current.name, current.stock
            )));
        }
        let stock = u32::try_from(target)
            .map_err(|_| Error::validation(format!("Stock level {target} is too large")))?;

        info!("Adjusting stock of {} by {:+}", id, delta);
        self.set_stock(id, stock).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::{fixed_clock, product_draft};
    use serde_json::json;

    async fn store_with_rice() -> Result<(ProductStore<MemoryStore>, Product)> {
        let mut store = ProductStore::open(MemoryStore::new(), fixed_clock()).await?;
        let rice = store.create(product_draft("Rice", 1200.0, 4)).await?;
        Ok((store, rice))
    }

    #[test]
    fn test_low_stock_alert_defaults_when_missing_or_garbage() {
        let base = json!({
            "id": "1",
            "name": "Rice",
            "price": 10.0,
            "stock": 3,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        });
        let missing: Product = serde_json::from_value(base.clone()).unwrap();
        assert_eq!(missing.low_stock_alert, DEFAULT_LOW_STOCK_ALERT);

        let mut garbage = base.clone();
        garbage["lowStockAlert"] = json!("soon");
        let garbage: Product = serde_json::from_value(garbage).unwrap();
        assert_eq!(garbage.low_stock_alert, DEFAULT_LOW_STOCK_ALERT);

        let mut null = base.clone();
        null["lowStockAlert"] = json!(null);
        let null: Product = serde_json::from_value(null).unwrap();
        assert_eq!(null.low_stock_alert, DEFAULT_LOW_STOCK_ALERT);

        let mut numeric_text = base;
        numeric_text["lowStockAlert"] = json!("4");
        let numeric_text: Product = serde_json::from_value(numeric_text).unwrap();
        assert_eq!(numeric_text.low_stock_alert, 4);
    }

    #[test]
    fn test_serializes_camel_case() {
        let product = Product::from_draft(
            "1".to_string(),
            product_draft("Rice", 10.0, 3),
            chrono::Utc::now(),
        )
        .unwrap();
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["lowStockAlert"], json!(10));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("barcode").is_none());
    }

    #[test]
    fn test_negative_stock_is_rejected_by_type() {
        let result = serde_json::from_value::<ProductPatch>(json!({ "stock": -1 }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_stock() -> Result<()> {
        let (mut store, rice) = store_with_rice().await?;
        let updated = store.set_stock(&rice.id, 0).await?;
        assert!(updated.is_out_of_stock());
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_stock() -> Result<()> {
        let (mut store, rice) = store_with_rice().await?;

        let restocked = store.adjust_stock(&rice.id, 6).await?;
        assert_eq!(restocked.stock, 10);

        let sold = store.adjust_stock(&rice.id, -10).await?;
        assert_eq!(sold.stock, 0);

        let result = store.adjust_stock(&rice.id, -1).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(store.get(&rice.id).map(|p| p.stock), Some(0));

        let result = store.adjust_stock("missing", 1).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_barcode_clears() -> Result<()> {
        let (mut store, rice) = store_with_rice().await?;
        let with_code = store
            .update(
                &rice.id,
                ProductPatch {
                    barcode: Some("12345".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(with_code.barcode.as_deref(), Some("12345"));

        let cleared = store
            .update(
                &rice.id,
                ProductPatch {
                    barcode: Some("  ".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(cleared.barcode, None);
        Ok(())
    }
}
