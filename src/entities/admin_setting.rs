//! Admin setting entity - Key-value store for admin configuration.
//! Holds the stored password hash under `admin_password_hash`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin setting database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_settings")]
pub struct Model {
    /// Setting key (e.g., `"admin_password_hash"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Setting value stored as string
    pub value: String,
    /// When this setting was last modified
    pub updated_at: DateTimeUtc,
}

/// `AdminSetting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
