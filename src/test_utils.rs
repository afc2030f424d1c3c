//! Shared test utilities for `StockFlow`.
//!
//! Fixtures for drafts and records, a manual clock pinned to a known instant, and
//! an in-memory `SQLite` database with the key-value table created.
#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        clock::ManualClock,
        entity_store::{Record, new_record_id},
        order::{Order, OrderDraft, OrderItem},
        product::{Product, ProductDraft},
        profile::ProfileDraft,
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The instant every fixed clock starts at: 2025-01-06 09:00 UTC.
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

/// A manual clock set to [`test_start`].
pub fn fixed_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(test_start()))
}

/// Product draft with the given name, price and stock.
///
/// # Defaults
/// * `category`: `"General"`
/// * `low_stock_alert`: unset (store default)
pub fn product_draft(name: &str, price: f64, stock: u32) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        price,
        stock,
        category: "General".to_string(),
        ..Default::default()
    }
}

/// A product record built directly, bypassing any store.
pub fn make_product(name: &str, price: f64, stock: u32, low_stock_alert: u32) -> Product {
    Product {
        id: new_record_id(),
        name: name.to_string(),
        price,
        stock,
        category: "General".to_string(),
        description: String::new(),
        low_stock_alert,
        barcode: None,
        created_at: test_start(),
        updated_at: test_start(),
    }
}

/// Order draft for the given customer and items.
pub fn order_draft(name: &str, phone: &str, items: Vec<OrderItem>) -> OrderDraft {
    OrderDraft {
        customer_name: name.to_string(),
        customer_phone: phone.to_string(),
        items,
        ..Default::default()
    }
}

/// An order record created at `at`, bypassing any store.
pub fn make_order(name: &str, items: Vec<OrderItem>, at: DateTime<Utc>) -> Order {
    Order::from_draft(new_record_id(), order_draft(name, "", items), at).unwrap()
}

/// Profile draft for owner "Ada" running `business_name`.
pub fn profile_draft(business_name: &str) -> ProfileDraft {
    ProfileDraft {
        owner_name: "Ada".to_string(),
        business_name: business_name.to_string(),
        ..Default::default()
    }
}

