//! Activity entity - Append-only record of administrative changes.
//!
//! `old_value`/`new_value` hold prices for price changes, 0/1 for availability toggles,
//! and 0 plus the resulting price for zone pricing writes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Activity log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_log")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the change happened
    pub timestamp: DateTimeUtc,
    /// Material name, or `"System"` for login/password events
    pub material: String,
    /// Unit label or event description
    pub unit: String,
    /// Value before the change
    pub old_value: f64,
    /// Value after the change
    pub new_value: f64,
    /// Action kind, see [`crate::core::activity::ActivityAction`]
    pub action: String,
    /// Zone the change applies to, for zone pricing writes
    pub zone: Option<String>,
}

/// Activity records have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
