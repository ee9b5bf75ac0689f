//! Seed catalog from config.toml.
//!
//! The `[[materials]]` entries are inserted on startup when missing and serve as the
//! defaults restored by [`reset_to_defaults`]. Existing rows are never overwritten by
//! seeding.

use crate::{
    core::{
        activity::{self, ActivityAction, NewActivity},
        catalog::{self, derive_identifier},
    },
    entities::{material, material_unit},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// A material to seed
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialSeed {
    /// Display name; the identifier is derived from it
    pub name: String,
    /// One of the fixed categories
    pub category: String,
    /// Description shown in the price list
    pub description: String,
    /// Units with their default prices
    #[serde(default)]
    pub units: Vec<UnitSeed>,
}

/// A unit to seed
#[derive(Debug, Clone, Deserialize)]
pub struct UnitSeed {
    /// Unit label; the value is derived from it
    pub label: String,
    /// Default base price
    pub price: f64,
}

/// Rows inserted by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Materials created
    pub materials: usize,
    /// Units created
    pub units: usize,
}

/// Inserts seeded materials and units that do not exist yet.
///
/// # Errors
/// Returns an error if a seed entry fails validation or a database operation fails.
#[instrument(skip_all)]
pub async fn seed_catalog(
    db: &DatabaseConnection,
    seed: &[MaterialSeed],
    now: DateTime<Utc>,
) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();
    for entry in seed {
        let material_id = derive_identifier(entry.name.trim());
        if catalog::get_material(db, &material_id).await?.is_none() {
            catalog::create_material(db, &entry.name, &entry.category, &entry.description, now)
                .await?;
            summary.materials += 1;
        }
        for unit in &entry.units {
            let value = derive_identifier(unit.label.trim());
            if catalog::get_unit(db, &material_id, &value).await?.is_none() {
                catalog::create_unit(db, &material_id, &unit.label, unit.price, now).await?;
                summary.units += 1;
            }
        }
    }
    info!(
        "Seeded {} material(s) and {} unit(s)",
        summary.materials, summary.units
    );
    Ok(summary)
}

/// Restores seeded materials and units to their configured defaults: seeded materials
/// and units become available again and seeded units get their default price back.
/// Missing seed rows are recreated. Logs one `reset` record and returns how many units
/// were restored.
///
/// # Errors
/// Returns an error if seeding or any write fails. Restoration runs in one transaction.
#[instrument(skip_all)]
pub async fn reset_to_defaults(
    db: &DatabaseConnection,
    seed: &[MaterialSeed],
    now: DateTime<Utc>,
) -> Result<usize> {
    seed_catalog(db, seed, now).await?;

    let txn = db.begin().await?;
    let mut restored = 0;
    for entry in seed {
        let material_id = derive_identifier(entry.name.trim());
        if let Some(row) = catalog::get_material(&txn, &material_id).await? {
            let mut active: material::ActiveModel = row.into();
            active.available = Set(true);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }
        for unit in &entry.units {
            let value = derive_identifier(unit.label.trim());
            if let Some(row) = catalog::get_unit(&txn, &material_id, &value).await? {
                let mut active: material_unit::ActiveModel = row.into();
                active.price = Set(unit.price);
                active.available = Set(true);
                active.updated_at = Set(now);
                active.update(&txn).await?;
                restored += 1;
            }
        }
    }
    txn.commit().await?;

    activity::record_activity(
        db,
        NewActivity {
            material: "All Materials".to_string(),
            unit: "Reset to Default".to_string(),
            old_value: 0.0,
            new_value: 0.0,
            action: ActivityAction::Reset,
            zone: None,
        },
        now,
    )
    .await?;
    info!("Reset {} unit(s) to default", restored);
    Ok(restored)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{
            activity::recent_activity,
            catalog::{UnitChanges, load_catalog},
        },
        errors::Error,
        test_utils::setup_test_db,
    };

    fn seed() -> Vec<MaterialSeed> {
        vec![
            MaterialSeed {
                name: "Hollow Blocks".to_string(),
                category: "Masonry".to_string(),
                description: "4-inch concrete hollow blocks".to_string(),
                units: vec![UnitSeed {
                    label: "Piece".to_string(),
                    price: 15.0,
                }],
            },
            MaterialSeed {
                name: "Gravel".to_string(),
                category: "Aggregates".to_string(),
                description: "3/4 crushed gravel".to_string(),
                units: vec![
                    UnitSeed {
                        label: "Cubic Meter".to_string(),
                        price: 1800.0,
                    },
                    UnitSeed {
                        label: "Sack".to_string(),
                        price: 90.0,
                    },
                ],
            },
        ]
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let first = seed_catalog(&db, &seed(), now).await?;
        assert_eq!(
            first,
            SeedSummary {
                materials: 2,
                units: 3
            }
        );
        let second = seed_catalog(&db, &seed(), now).await?;
        assert_eq!(second, SeedSummary::default());

        let catalog = load_catalog(&db).await?;
        assert_eq!(catalog.materials.len(), 2);
        assert_eq!(catalog.materials[0].material.id, "gravel");
        assert_eq!(catalog.materials[0].units.len(), 2);
        assert!(recent_activity(&db, 10).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_does_not_overwrite_edits() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        seed_catalog(&db, &seed(), now).await?;
        catalog::update_unit(
            &db,
            "gravel",
            "sack",
            UnitChanges {
                price: Some(95.0),
                available: None,
            },
            now,
        )
        .await?;

        seed_catalog(&db, &seed(), now).await?;
        let unit = catalog::get_unit(&db, "gravel", "sack").await?.unwrap();
        assert_eq!(unit.price, 95.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_rejects_unknown_category() -> Result<()> {
        let db = setup_test_db().await?;
        let mut bad = seed();
        bad[0].category = "Lumber".to_string();
        assert!(matches!(
            seed_catalog(&db, &bad, Utc::now()).await,
            Err(Error::UnknownCategory { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_restores_prices_and_availability() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        seed_catalog(&db, &seed(), now).await?;

        catalog::update_unit(
            &db,
            "gravel",
            "cubic-meter",
            UnitChanges {
                price: Some(2100.0),
                available: Some(false),
            },
            now,
        )
        .await?;
        catalog::set_material_availability(&db, "hollow-blocks", false, now).await?;
        catalog::delete_unit(&db, "gravel", "sack").await?;

        let restored = reset_to_defaults(&db, &seed(), now).await?;
        assert_eq!(restored, 3);

        let unit = catalog::get_unit(&db, "gravel", "cubic-meter").await?.unwrap();
        assert_eq!(unit.price, 1800.0);
        assert!(unit.available);
        assert!(catalog::get_unit(&db, "gravel", "sack").await?.is_some());
        let blocks = catalog::get_material(&db, "hollow-blocks").await?.unwrap();
        assert!(blocks.available);

        let log = recent_activity(&db, 1).await?;
        assert_eq!(log[0].action, "reset");
        assert_eq!(log[0].material, "All Materials");
        assert_eq!(log[0].unit, "Reset to Default");
        Ok(())
    }
}
