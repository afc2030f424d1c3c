//! Plain-text receipts.

use crate::core::{order::Order, profile::Profile, report::format_amount};

/// Business name used when no profile exists.
pub const FALLBACK_BUSINESS_NAME: &str = "StockFlow Business";

const RULE: &str = "-------------------";

/// Renders `order` as a shareable text receipt.
///
/// The header carries the business name, plus phone and address when the profile
/// has them. Amounts are prefixed with `currency_symbol`.
#[must_use]
pub fn format_receipt(order: &Order, profile: Option<&Profile>, currency_symbol: &str) -> String {
    let business = profile.map_or(FALLBACK_BUSINESS_NAME, |p| p.business_name.as_str());
    let money = |amount: f64| format_amount(currency_symbol, amount);

    let mut lines = vec!["RECEIPT".to_string(), business.to_string()];
    if let Some(phone) = profile.and_then(|p| p.phone.as_deref()) {
        lines.push(format!("Tel: {phone}"));
    }
    if let Some(address) = profile.and_then(|p| p.address.as_deref()) {
        lines.push(address.to_string());
    }

    lines.extend([
        String::new(),
        RULE.to_string(),
        format!("Receipt #: {}", order.id),
        format!("Date: {}", order.date.format("%Y-%m-%d %H:%M")),
        format!("Customer: {}", order.customer_name),
        String::new(),
        "ITEMS:".to_string(),
    ]);
    for item in &order.items {
        lines.push(item.name.clone());
        lines.push(format!(
            "  {} x {} = {}",
            item.quantity,
            money(item.price),
            money(item.line_total())
        ));
    }

    lines.extend([
        String::new(),
        RULE.to_string(),
        format!("TOTAL: {}", money(order.total)),
        String::new(),
        "Thank you for your business!".to_string(),
    ]);
    lines.join("\n")
}
