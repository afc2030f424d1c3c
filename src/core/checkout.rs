//! Order placement across the order and customer stores.

use crate::{
    core::{
        customer::{CustomerContact, CustomerStore},
        order::{Order, OrderDraft, OrderStore},
    },
    errors::Result,
    storage::KeyValueStore,
};
use tracing::{error, info, instrument};

/// Creates an order and records its customer.
///
/// The customer is upserted by phone only when both name and phone are present.
/// A failed order write leaves the order in memory, to be written with the next
/// successful one, so the customer is upserted in that case too. A failed
/// customer write is logged, not returned.
///
/// # Errors
/// - Validation errors from the draft; nothing is created.
/// - [`Error::Persistence`] if the order write fails. The order and its customer
///   remain in memory.
///
/// [`Error::Persistence`]: crate::errors::Error::Persistence
#[instrument(skip_all)]
pub async fn place_order<S: KeyValueStore>(
    orders: &mut OrderStore<S>,
    customers: &mut CustomerStore<S>,
    draft: OrderDraft,
) -> Result<Order> {
    let order = orders.insert(draft)?;
    let saved = orders.persist().await;
    info!("Placed order {} for {}", order.id, order.total);

    if !order.customer_name.is_empty() && !order.customer_phone.is_empty() {
        let contact = CustomerContact {
            name: order.customer_name.clone(),
            phone: order.customer_phone.clone(),
            email: order.customer_email.clone(),
        };
        if let Err(e) = customers.upsert_by_phone(contact).await {
            error!("Failed to record customer for order {}: {}", order.id, e);
        }
    }

    saved?;
    Ok(order)
}
