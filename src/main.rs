use dotenvy::dotenv;
use std::sync::Arc;
use stockflow::{
    config::{self, database},
    context::BusinessState,
    core::clock::SystemClock,
    errors::Result,
    storage::DatabaseStore,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Open the database and make sure the key-value table exists
    let database_url = database::resolve_database_url(&app_config.database_url);
    let db = database::create_connection(&database_url)
        .await
        .inspect(|_| info!("Database connected."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Load the business state
    let storage = DatabaseStore::new(db.clone());
    let vault = DatabaseStore::namespaced(db, "vault");
    let mut state =
        BusinessState::open(storage, vault, Arc::new(SystemClock), &app_config).await?;

    match state.session.profile() {
        Some(profile) => info!("Business: {}", profile.business_name),
        None => warn!("No business profile yet."),
    }

    match state.subscription.current().await? {
        Some(subscription) => info!(
            "Subscription {} with {} days remaining",
            subscription.status,
            state.subscription.days_remaining().unwrap_or(0)
        ),
        None => info!("No subscription."),
    }

    let summary = state.dashboard();
    info!(
        "Dashboard: {} products ({} low, {} out), {} orders, {} today",
        summary.product_count,
        summary.low_stock_count,
        summary.out_of_stock_count,
        summary.order_count,
        summary.todays_orders
    );

    Ok(())
}
