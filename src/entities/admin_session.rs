//! Admin session entity - Server-side record of an opaque admin session token.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_sessions")]
pub struct Model {
    /// Opaque session token
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    /// When the admin logged in
    pub login_at: DateTimeUtc,
    /// Last mutating action performed with this token
    pub last_activity: DateTimeUtc,
}

/// `AdminSession` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
