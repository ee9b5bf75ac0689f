//! Material unit entity - A sellable unit of a material ("Bag", "Cubic Meter") with its base price.
//!
//! Units are unique per (`material_id`, `value`). The base price is the price before any
//! zone adjustment is applied.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Material unit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "material_units")]
pub struct Model {
    /// Surrogate key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning material
    pub material_id: String,
    /// Identifier derived from the label, unique within the material
    pub value: String,
    /// Human label (e.g. "Bag (40kg)")
    pub label: String,
    /// Base price in pesos, within [0, 1,000,000]
    pub price: f64,
    /// Whether customers can order this unit
    pub available: bool,
    /// When the unit was created
    pub created_at: DateTimeUtc,
    /// When the unit was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `MaterialUnit` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each unit belongs to one material
    #[sea_orm(
        belongs_to = "super::material::Entity",
        from = "Column::MaterialId",
        to = "super::material::Column::Id",
        on_delete = "Cascade"
    )]
    Material,
}

impl Related<super::material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Material.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
