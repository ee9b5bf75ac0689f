//! Zone price entity - A per-zone override for one material unit.
//!
//! At most one row exists per (`zone_id`, `material_id`, `unit_value`). A missing row means
//! the base price applies unchanged. When `fixed_price` is set it wins over `multiplier`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Zone price override database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "zone_prices")]
pub struct Model {
    /// Surrogate key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Zone this override applies to
    pub zone_id: i64,
    /// Material identifier
    pub material_id: String,
    /// Unit value within the material
    pub unit_value: String,
    /// Factor applied to the base price, within [0, 10]
    pub multiplier: f64,
    /// Absolute price that replaces the base price when present
    pub fixed_price: Option<f64>,
    /// When the override was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `ZonePrice` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each override belongs to one zone
    #[sea_orm(
        belongs_to = "super::zone::Entity",
        from = "Column::ZoneId",
        to = "super::zone::Column::Id",
        on_delete = "Cascade"
    )]
    Zone,
}

impl Related<super::zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zone.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
