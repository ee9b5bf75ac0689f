//! Location-aware price resolution.
//!
//! A unit's effective price in a zone is its base price unless the zone has an override
//! for that (material, unit): a fixed price wins outright, otherwise the base price is
//! multiplied and rounded to the nearest peso (halves round up). The resolver itself is a
//! pure lookup over a [`PricingTable`] snapshot; bounds are enforced only when an override
//! is written.

use crate::{
    core::{
        activity::{self, ActivityAction, NewActivity},
        catalog, zone,
    },
    entities::{Zone, ZonePrice, zone as zone_entity, zone_price},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

/// Largest multiplier an admin may store.
pub const MAX_MULTIPLIER: f64 = 10.0;

/// A zone's adjustment for one material unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceOverride {
    /// Factor applied to the base price
    pub multiplier: f64,
    /// Absolute price that replaces the base price
    pub fixed_price: Option<f64>,
}

impl Default for PriceOverride {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            fixed_price: None,
        }
    }
}

impl From<&zone_price::Model> for PriceOverride {
    fn from(row: &zone_price::Model) -> Self {
        Self {
            multiplier: row.multiplier,
            fixed_price: row.fixed_price,
        }
    }
}

/// Applies an optional override to a base price.
#[must_use]
pub fn apply_override(base_price: f64, price_override: Option<&PriceOverride>) -> f64 {
    match price_override {
        None => base_price,
        Some(PriceOverride {
            fixed_price: Some(fixed),
            ..
        }) => *fixed,
        Some(PriceOverride { multiplier, .. }) => (base_price * multiplier).round(),
    }
}

/// Validates a multiplier and optional fixed price before they are stored.
pub fn validate_override(multiplier: f64, fixed_price: Option<f64>) -> Result<()> {
    if !multiplier.is_finite() || !(0.0..=MAX_MULTIPLIER).contains(&multiplier) {
        return Err(Error::InvalidMultiplier { multiplier });
    }
    match fixed_price {
        Some(price) if !price.is_finite() || price < 0.0 => Err(Error::InvalidPrice { price }),
        _ => Ok(()),
    }
}

type OverrideKey = (String, String);

/// Snapshot of every zone and its overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingTable {
    zones: BTreeMap<String, HashMap<OverrideKey, PriceOverride>>,
}

impl PricingTable {
    /// Registers a zone with no overrides.
    pub fn add_zone(&mut self, zone: &str) {
        self.zones.entry(zone.to_string()).or_default();
    }

    /// Inserts or replaces the override for (zone, material, unit).
    pub fn insert(
        &mut self,
        zone: &str,
        material_id: &str,
        unit_value: &str,
        price_override: PriceOverride,
    ) {
        self.zones
            .entry(zone.to_string())
            .or_default()
            .insert((material_id.to_string(), unit_value.to_string()), price_override);
    }

    /// Known zone names in sorted order.
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    /// The override stored for (zone, material, unit), if any.
    #[must_use]
    pub fn override_for(
        &self,
        zone: &str,
        material_id: &str,
        unit_value: &str,
    ) -> Option<&PriceOverride> {
        self.zones
            .get(zone)?
            .get(&(material_id.to_string(), unit_value.to_string()))
    }

    /// The effective price of a unit in `zone`. An empty or unset zone, or a zone with no
    /// override for this unit, yields `base_price` unchanged.
    #[must_use]
    pub fn resolve_price(
        &self,
        material_id: &str,
        unit_value: &str,
        base_price: f64,
        zone: Option<&str>,
    ) -> f64 {
        let price_override = zone
            .filter(|z| !z.is_empty())
            .and_then(|z| self.override_for(z, material_id, unit_value));
        apply_override(base_price, price_override)
    }
}

/// Loads all zones and their overrides into a [`PricingTable`].
///
/// # Errors
/// Returns an error if the query fails.
pub async fn load_pricing_table(db: &DatabaseConnection) -> Result<PricingTable> {
    let rows = Zone::find()
        .order_by_asc(zone_entity::Column::Name)
        .find_with_related(ZonePrice)
        .all(db)
        .await?;

    let mut table = PricingTable::default();
    for (zone, overrides) in rows {
        table.add_zone(&zone.name);
        for row in &overrides {
            table.insert(&zone.name, &row.material_id, &row.unit_value, row.into());
        }
    }
    Ok(table)
}

/// Writes the override for (zone, material, unit), replacing any existing row, and logs a
/// `barangay_pricing` record with 0 as the old value and the resulting price as the new one.
///
/// # Errors
/// Returns an error if:
/// - the multiplier is outside [0, 10] or the fixed price is negative
/// - the zone or unit does not exist
/// - a database write fails
#[instrument(skip(db))]
pub async fn set_zone_price(
    db: &DatabaseConnection,
    zone_name: &str,
    material_id: &str,
    unit_value: &str,
    price_override: PriceOverride,
    now: DateTime<Utc>,
) -> Result<zone_price::Model> {
    validate_override(price_override.multiplier, price_override.fixed_price)?;
    let zone = zone::require_zone(db, zone_name).await?;
    let material = catalog::get_material(db, material_id)
        .await?
        .ok_or_else(|| Error::MaterialNotFound {
            id: material_id.to_string(),
        })?;
    let unit = catalog::get_unit(db, material_id, unit_value)
        .await?
        .ok_or_else(|| Error::UnitNotFound {
            material_id: material_id.to_string(),
            value: unit_value.to_string(),
        })?;

    let existing = ZonePrice::find()
        .filter(zone_price::Column::ZoneId.eq(zone.id))
        .filter(zone_price::Column::MaterialId.eq(material_id))
        .filter(zone_price::Column::UnitValue.eq(unit_value))
        .one(db)
        .await?;

    let saved = if let Some(row) = existing {
        let mut active: zone_price::ActiveModel = row.into();
        active.multiplier = Set(price_override.multiplier);
        active.fixed_price = Set(price_override.fixed_price);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        zone_price::ActiveModel {
            zone_id: Set(zone.id),
            material_id: Set(material_id.to_string()),
            unit_value: Set(unit_value.to_string()),
            multiplier: Set(price_override.multiplier),
            fixed_price: Set(price_override.fixed_price),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    let resolved = apply_override(unit.price, Some(&price_override));
    activity::record_activity(
        db,
        NewActivity {
            material: material.name,
            unit: unit.label,
            old_value: 0.0,
            new_value: resolved,
            action: ActivityAction::ZonePricing,
            zone: Some(zone.name.clone()),
        },
        now,
    )
    .await?;
    info!(
        "Zone '{}' pricing for {}/{} set (multiplier {}, fixed {:?}) -> {}",
        zone.name,
        material_id,
        unit_value,
        price_override.multiplier,
        price_override.fixed_price,
        resolved
    );
    Ok(saved)
}
