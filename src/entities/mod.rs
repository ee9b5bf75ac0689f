//! Entity module - Contains all `SeaORM` entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod activity;
pub mod admin_session;
pub mod admin_setting;
pub mod material;
pub mod material_unit;
pub mod zone;
pub mod zone_price;

pub use activity::{Column as ActivityColumn, Entity as Activity, Model as ActivityModel};
pub use admin_session::{
    Column as AdminSessionColumn, Entity as AdminSession, Model as AdminSessionModel,
};
pub use admin_setting::{
    Column as AdminSettingColumn, Entity as AdminSetting, Model as AdminSettingModel,
};
pub use material::{Column as MaterialColumn, Entity as Material, Model as MaterialModel};
pub use material_unit::{
    Column as MaterialUnitColumn, Entity as MaterialUnit, Model as MaterialUnitModel,
};
pub use zone::{Column as ZoneColumn, Entity as Zone, Model as ZoneModel};
pub use zone_price::{Column as ZonePriceColumn, Entity as ZonePrice, Model as ZonePriceModel};
