//! Zone entity - A named delivery area (barangay) used as the key for price overrides.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Zone database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "zones")]
pub struct Model {
    /// Surrogate key referenced by zone prices
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Zone name, unique across the system
    #[sea_orm(unique)]
    pub name: String,
    /// When the zone was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Zone and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One zone has many price overrides
    #[sea_orm(has_many = "super::zone_price::Entity")]
    Prices,
}

impl Related<super::zone_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
