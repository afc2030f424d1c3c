//! Key-value entry entity - one row per persisted snapshot.
//!
//! Collections (`products`, `orders`, `customers`) and single records
//! (`subscriptionData`, `userData`) are stored as JSON text under their key.
//! Writes always replace the whole value.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kv_store")]
pub struct Model {
    /// Storage key (e.g. `"products"`), optionally prefixed by a namespace
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Serialized JSON payload
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this key was last written
    pub updated_at: DateTime,
}

/// `KvEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
