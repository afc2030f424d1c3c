//! Database configuration module.
//!
//! Handles the `SQLite` connection and creates the single key-value table from its
//! entity definition with `Schema::create_table_from_entity`, so the schema always
//! matches the Rust struct.

use crate::entities::KvEntry;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

/// Default location of the local database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://stockflow.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back
/// to `configured` when it is unset.
#[must_use]
pub fn resolve_database_url(configured: &str) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| configured.to_string())
}

/// Opens a connection to the given database URL.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the key-value table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut kv_table = schema.create_table_from_entity(KvEntry);
    kv_table.if_not_exists();
    db.execute(builder.build(&kv_table)).await?;

    info!("Database tables ensured.");
    Ok(())
}
