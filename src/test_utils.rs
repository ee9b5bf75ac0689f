//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and building catalog fixtures with sensible defaults.

use crate::{
    core::{
        catalog::{self, Catalog, CatalogMaterial},
        credentials,
        order::CustomerInfo,
    },
    entities::{material, material_unit},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Password provisioned by [`setup_with_admin`].
pub const TEST_ADMIN_PASSWORD: &str = "test-admin-password";

/// Routes tracing output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test database with [`TEST_ADMIN_PASSWORD`] provisioned.
pub async fn setup_with_admin() -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    credentials::provision_admin_password(&db, Some(TEST_ADMIN_PASSWORD), Utc::now()).await?;
    Ok(db)
}

/// Creates a test database holding one material with one unit.
///
/// # Defaults
/// * material: "Cement" (`cement`) in "Binding Materials"
/// * unit: "Bag" (`bag`) at 250.0
pub async fn setup_with_unit() -> Result<(DatabaseConnection, material::Model, material_unit::Model)>
{
    let db = setup_test_db().await?;
    let now = Utc::now();
    let material = catalog::create_material(
        &db,
        "Cement",
        "Binding Materials",
        "Portland cement, 40kg",
        now,
    )
    .await?;
    let unit = catalog::create_unit(&db, &material.id, "Bag", 250.0, now).await?;
    Ok((db, material, unit))
}

fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builds a material model without touching the database.
pub fn test_material(id: &str, name: &str, category: &str, available: bool) -> material::Model {
    material::Model {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: format!("{name} for testing"),
        available,
        created_at: fixture_time(),
        updated_at: fixture_time(),
    }
}

/// Builds a unit model without touching the database.
pub fn test_unit(
    id: i64,
    material_id: &str,
    value: &str,
    label: &str,
    price: f64,
    available: bool,
) -> material_unit::Model {
    material_unit::Model {
        id,
        material_id: material_id.to_string(),
        value: value.to_string(),
        label: label.to_string(),
        price,
        available,
        created_at: fixture_time(),
        updated_at: fixture_time(),
    }
}

/// An in-memory catalog in load order (category, then name).
///
/// * Sand (unavailable) with an available "Sack" at 1200
/// * Cement with an available "Bag" at 250 and an unavailable "Pallet" at 9000
pub fn sample_catalog() -> Catalog {
    Catalog {
        materials: vec![
            CatalogMaterial {
                material: test_material("sand", "Sand", "Aggregates", false),
                units: vec![test_unit(3, "sand", "sack", "Sack", 1200.0, true)],
            },
            CatalogMaterial {
                material: test_material("cement", "Cement", "Binding Materials", true),
                units: vec![
                    test_unit(1, "cement", "bag", "Bag", 250.0, true),
                    test_unit(2, "cement", "pallet", "Pallet", 9000.0, false),
                ],
            },
        ],
    }
}

/// Customer details with every required field filled in.
pub fn complete_customer(delivery_date: NaiveDate) -> CustomerInfo {
    CustomerInfo {
        name: "Juan Dela Cruz".to_string(),
        contact_number: "09171234567".to_string(),
        delivery_date: Some(delivery_date),
        zone: Some("Zone A".to_string()),
        delivery_address: "123 Rizal St., Zone A".to_string(),
    }
}
