//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models. The composite uniqueness rules that
//! `SeaORM` attributes cannot express (unit value per material, one override per zone key)
//! are added as explicit unique indexes.

use crate::entities::{
    Activity, AdminSession, AdminSetting, Material, MaterialUnit, Zone, ZonePrice,
    material_unit, zone_price,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/material_orders.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`], creating the
/// parent directory of a `SQLite` file if needed.
///
/// # Errors
/// Returns an error if the connection cannot be opened.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let file = path.split('?').next().unwrap_or(path);
        if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables and unique indexes if they do not already exist.
///
/// Parents are created before children so foreign keys resolve.
///
/// # Errors
/// Returns an error if any statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Material).await?;
    create_table(db, &schema, MaterialUnit).await?;
    create_table(db, &schema, Zone).await?;
    create_table(db, &schema, ZonePrice).await?;
    create_table(db, &schema, Activity).await?;
    create_table(db, &schema, AdminSetting).await?;
    create_table(db, &schema, AdminSession).await?;

    let unit_key = Index::create()
        .name("idx_material_units_material_value")
        .table(MaterialUnit)
        .col(material_unit::Column::MaterialId)
        .col(material_unit::Column::Value)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&unit_key)).await?;

    let override_key = Index::create()
        .name("idx_zone_prices_zone_material_unit")
        .table(ZonePrice)
        .col(zone_price::Column::ZoneId)
        .col(zone_price::Column::MaterialId)
        .col(zone_price::Column::UnitValue)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&override_key)).await?;

    info!("Database tables ensured.");
    Ok(())
}
