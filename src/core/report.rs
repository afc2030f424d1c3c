//! Aggregation queries.
//!
//! Read-only views derived from product and order snapshots: stock alerts, totals,
//! search, sorting and the dashboard summary. Everything here is a pure function
//! over slices, so the same code serves stores, tests and ad-hoc data.

use crate::core::{
    order::{Order, OrderStatus},
    product::Product,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Sort direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Product sort keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductSort {
    /// Case-insensitive name
    Name,
    /// Unit price
    Price,
    /// Units on hand
    Stock,
    /// Creation time
    Date,
}

/// Order sort keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderSort {
    /// Business date
    Date,
    /// Order total
    Total,
    /// Case-insensitive customer name
    CustomerName,
}

/// Products whose stock is at or below their alert threshold.
#[must_use]
pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

/// Products with no units left.
#[must_use]
pub fn out_of_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_out_of_stock()).collect()
}

/// `Σ price × stock` over all products.
#[must_use]
pub fn total_inventory_value(products: &[Product]) -> f64 {
    products.iter().map(Product::stock_value).sum()
}

/// `Σ total` over all orders.
#[must_use]
pub fn total_sales(orders: &[Order]) -> f64 {
    orders.iter().map(|o| o.total).sum()
}

/// Case-insensitive match on name or category, or a barcode containing `query`.
///
/// An empty query returns every product.
#[must_use]
pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    if query.is_empty() {
        return products.iter().collect();
    }
    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p.barcode.as_deref().is_some_and(|b| b.contains(query))
        })
        .collect()
}

/// Products whose category equals `category`, ignoring case.
#[must_use]
pub fn products_in_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.category.to_lowercase() == category.to_lowercase())
        .collect()
}

/// Sorted copy of `products`. Equal keys keep their relative order.
#[must_use]
pub fn sort_products<'a>(
    products: &'a [Product],
    criterion: ProductSort,
    direction: SortDirection,
) -> Vec<&'a Product> {
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = match criterion {
            ProductSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            ProductSort::Price => a.price.total_cmp(&b.price),
            ProductSort::Stock => a.stock.cmp(&b.stock),
            ProductSort::Date => a.created_at.cmp(&b.created_at),
        };
        direction.apply(ordering)
    });
    sorted
}

/// Orders with the given status.
#[must_use]
pub fn orders_with_status(orders: &[Order], status: OrderStatus) -> Vec<&Order> {
    orders.iter().filter(|o| o.status == status).collect()
}

/// Orders created within `[start, end]`.
#[must_use]
pub fn orders_between(orders: &[Order], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| o.created_at >= start && o.created_at <= end)
        .collect()
}

/// Orders placed with the given phone number.
#[must_use]
pub fn orders_for_customer<'a>(orders: &'a [Order], phone: &str) -> Vec<&'a Order> {
    let phone = phone.trim();
    orders.iter().filter(|o| o.customer_phone == phone).collect()
}

/// Case-insensitive match on customer name. An empty query returns every order.
#[must_use]
pub fn search_orders<'a>(orders: &'a [Order], query: &str) -> Vec<&'a Order> {
    let needle = query.to_lowercase();
    orders
        .iter()
        .filter(|o| o.customer_name.to_lowercase().contains(&needle))
        .collect()
}

/// Sorted copy of `orders`. Equal keys keep their relative order.
#[must_use]
pub fn sort_orders<'a>(
    orders: &'a [Order],
    criterion: OrderSort,
    direction: SortDirection,
) -> Vec<&'a Order> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = match criterion {
            OrderSort::Date => a.date.cmp(&b.date),
            OrderSort::Total => a.total.total_cmp(&b.total),
            OrderSort::CustomerName => a
                .customer_name
                .to_lowercase()
                .cmp(&b.customer_name.to_lowercase()),
        };
        direction.apply(ordering)
    });
    sorted
}

/// Figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    /// Number of products
    pub product_count: usize,
    /// Products at or below their alert threshold
    pub low_stock_count: usize,
    /// Products with zero stock
    pub out_of_stock_count: usize,
    /// `Σ price × stock`
    pub inventory_value: f64,
    /// Number of orders
    pub order_count: usize,
    /// Orders still pending
    pub pending_orders: usize,
    /// `Σ total` over all orders
    pub total_sales: f64,
    /// Orders dated on the same UTC day as `now`
    pub todays_orders: usize,
    /// Sales dated on the same UTC day as `now`
    pub todays_sales: f64,
}

/// Computes the dashboard figures at `now`.
#[must_use]
pub fn dashboard_summary(
    products: &[Product],
    orders: &[Order],
    now: DateTime<Utc>,
) -> DashboardSummary {
    let today = now.date_naive();
    let todays: Vec<&Order> = orders
        .iter()
        .filter(|o| o.date.date_naive() == today)
        .collect();

    DashboardSummary {
        product_count: products.len(),
        low_stock_count: low_stock(products).len(),
        out_of_stock_count: out_of_stock(products).len(),
        inventory_value: total_inventory_value(products),
        order_count: orders.len(),
        pending_orders: orders_with_status(orders, OrderStatus::Pending).len(),
        total_sales: total_sales(orders),
        todays_orders: todays.len(),
        todays_sales: todays.iter().map(|o| o.total).sum(),
    }
}

/// Formats an amount with two decimals after `symbol`, e.g. `₦1,250.00`.
#[must_use]
pub fn format_amount(symbol: &str, amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{fraction}")
}
