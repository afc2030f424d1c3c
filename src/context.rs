//! Application context - every store the app needs, opened once per process.

use crate::{
    config::AppConfig,
    core::{
        checkout,
        clock::Clock,
        customer::CustomerStore,
        order::{Order, OrderDraft, OrderStore},
        product::{Product, ProductDraft, ProductStore},
        profile::{Profile, ProfileDraft, Session},
        receipt::format_receipt,
        report::{DashboardSummary, dashboard_summary},
        subscription::SubscriptionLifecycle,
    },
    errors::{Error, Result},
    storage::KeyValueStore,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared state for one business.
///
/// `S` holds business data, `V` holds the session token.
pub struct BusinessState<S, V> {
    /// Inventory
    pub products: ProductStore<S>,
    /// Orders
    pub orders: OrderStore<S>,
    /// Customers, maintained by order placement
    pub customers: CustomerStore<S>,
    /// Subscription gate
    pub subscription: SubscriptionLifecycle<S>,
    /// Profile and authentication
    pub session: Session<S, V>,
    clock: Arc<dyn Clock>,
    currency_symbol: String,
}

impl<S: KeyValueStore, V: KeyValueStore> BusinessState<S, V> {
    /// Loads every store from `storage` and the session from `vault`.
    ///
    /// Collections whose snapshots fail to parse start empty, as described on
    /// [`crate::core::entity_store::EntityStore::load`].
    ///
    /// # Errors
    /// - [`Error::Config`] if the configured subscription plan is invalid.
    /// - [`Error::Persistence`] if any storage read fails.
    #[instrument(skip_all)]
    pub async fn open(storage: S, vault: V, clock: Arc<dyn Clock>, config: &AppConfig) -> Result<Self> {
        let products = ProductStore::open(storage.clone(), Arc::clone(&clock)).await?;
        let orders = OrderStore::open(storage.clone(), Arc::clone(&clock)).await?;
        let customers = CustomerStore::open(storage.clone(), Arc::clone(&clock)).await?;
        let subscription = SubscriptionLifecycle::open(
            storage.clone(),
            Arc::clone(&clock),
            config.subscription.clone(),
        )
        .await?;
        let session = Session::restore(storage, vault, Arc::clone(&clock)).await?;

        info!(
            "Opened business state: {} products, {} orders, {} customers",
            products.len(),
            orders.len(),
            customers.len()
        );

        Ok(Self {
            products,
            orders,
            customers,
            subscription,
            session,
            clock,
            currency_symbol: config.receipt.currency_symbol.clone(),
        })
    }

    /// Creates the business profile and starts its trial.
    ///
    /// # Errors
    /// [`Error::Validation`] for missing names, or [`Error::Persistence`] if a
    /// write fails.
    pub async fn create_profile(&mut self, draft: ProfileDraft) -> Result<Profile> {
        self.session
            .create_profile(draft, &mut self.subscription)
            .await
    }

    /// Signs out and forgets the profile and subscription.
    ///
    /// # Errors
    /// [`Error::Persistence`] if a removal fails.
    pub async fn logout(&mut self) -> Result<()> {
        self.session.logout(&mut self.subscription).await
    }

    /// Adds a product. Requires an active subscription.
    ///
    /// # Errors
    /// - [`Error::SubscriptionInactive`] without an active subscription.
    /// - Any error from [`crate::core::entity_store::EntityStore::create`].
    pub async fn add_product(&mut self, draft: ProductDraft) -> Result<Product> {
        self.subscription.require_active().await?;
        self.products.create(draft).await
    }

    /// Places an order and records its customer. Requires an active subscription.
    ///
    /// # Errors
    /// - [`Error::SubscriptionInactive`] without an active subscription.
    /// - Any error from [`checkout::place_order`].
    pub async fn place_order(&mut self, draft: OrderDraft) -> Result<Order> {
        self.subscription.require_active().await?;
        checkout::place_order(&mut self.orders, &mut self.customers, draft).await
    }

    /// Dashboard figures for the current time.
    #[must_use]
    pub fn dashboard(&self) -> DashboardSummary {
        dashboard_summary(self.products.all(), self.orders.all(), self.clock.now())
    }

    /// Receipt text for an order.
    ///
    /// # Errors
    /// [`Error::NotFound`] if no order has `order_id`.
    pub fn receipt(&self, order_id: &str) -> Result<String> {
        let order = self.orders.get(order_id).ok_or_else(|| Error::NotFound {
            kind: "order",
            id: order_id.to_string(),
        })?;
        Ok(format_receipt(
            order,
            self.session.profile(),
            &self.currency_symbol,
        ))
    }
}
