//! Material entity - A catalog item such as "Hollow Blocks" or "Portland Cement".
//!
//! The primary key is a stable string identifier derived from the material name.
//! Each material owns its units; deleting a material removes its units.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Material database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "materials")]
pub struct Model {
    /// Identifier derived from the name (e.g. `"portland-cement"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name
    pub name: String,
    /// One of the fixed material categories (see [`crate::core::catalog::Category`])
    pub category: String,
    /// Free-text description shown in the price list
    pub description: String,
    /// Whether customers can order this material
    pub available: bool,
    /// When the material was created
    pub created_at: DateTimeUtc,
    /// When the material was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Material and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One material has many units
    #[sea_orm(has_many = "super::material_unit::Entity")]
    Units,
}

impl Related<super::material_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Units.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
